pub mod albums;
pub mod artists;
pub mod likes;
pub mod meta;
pub mod playlists;
pub mod search;
pub mod tracks;
pub mod uploads;
pub mod users;
