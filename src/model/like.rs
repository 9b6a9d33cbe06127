// Use 3rd party
use serde::{Deserialize, Serialize};

// Use built-in library
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeTarget {
    Track,
    Album,
    Artist,
    Playlist,
}

impl LikeTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            LikeTarget::Track => "track",
            LikeTarget::Album => "album",
            LikeTarget::Artist => "artist",
            LikeTarget::Playlist => "playlist",
        }
    }
}

impl fmt::Display for LikeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's "liked" mark on a track, album, artist or playlist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Like {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub target_type: LikeTarget,
    pub target_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}
