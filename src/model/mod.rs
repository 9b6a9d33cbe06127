pub mod album;
pub mod artist;
pub mod like;
pub mod playlist;
pub mod track;
pub mod user;

// Use 3rd party
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// Use local
use crate::model::album::Album;
use crate::model::artist::Artist;
use crate::model::like::Like;
use crate::model::playlist::Playlist;
use crate::model::track::Track;
use crate::model::user::User;

/// A typed document stored in a named collection.
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    fn id(&self) -> Option<&str>;
}

macro_rules! impl_document {
    ($model:ty, $collection:expr) => {
        impl Document for $model {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }
        }
    };
}

impl_document!(User, "users");
impl_document!(Artist, "artists");
impl_document!(Track, "tracks");
impl_document!(Album, "albums");
impl_document!(Playlist, "playlists");
impl_document!(Like, "likes");

/// Any document of the music catalogue, tagged by the collection it lives in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "collection", content = "document")]
pub enum Entity {
    #[serde(rename = "users")]
    User(User),
    #[serde(rename = "artists")]
    Artist(Artist),
    #[serde(rename = "tracks")]
    Track(Track),
    #[serde(rename = "albums")]
    Album(Album),
    #[serde(rename = "playlists")]
    Playlist(Playlist),
    #[serde(rename = "likes")]
    Like(Like),
}

impl Entity {
    pub fn collection(&self) -> &'static str {
        match self {
            Entity::User(_) => User::COLLECTION,
            Entity::Artist(_) => Artist::COLLECTION,
            Entity::Track(_) => Track::COLLECTION,
            Entity::Album(_) => Album::COLLECTION,
            Entity::Playlist(_) => Playlist::COLLECTION,
            Entity::Like(_) => Like::COLLECTION,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Entity::User(user) => user.id(),
            Entity::Artist(artist) => artist.id(),
            Entity::Track(track) => track.id(),
            Entity::Album(album) => album.id(),
            Entity::Playlist(playlist) => playlist.id(),
            Entity::Like(like) => like.id(),
        }
    }

    /// Parses a raw document according to the collection it came from.
    pub fn from_value(collection: &str, value: serde_json::Value) -> Option<serde_json::Result<Self>> {
        let entity = match collection {
            "users" => serde_json::from_value(value).map(Entity::User),
            "artists" => serde_json::from_value(value).map(Entity::Artist),
            "tracks" => serde_json::from_value(value).map(Entity::Track),
            "albums" => serde_json::from_value(value).map(Entity::Album),
            "playlists" => serde_json::from_value(value).map(Entity::Playlist),
            "likes" => serde_json::from_value(value).map(Entity::Like),
            _ => return None,
        };
        Some(entity)
    }
}
