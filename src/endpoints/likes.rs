//! Endpoint functions related to likes
//!
//! A like is its own document in the `likes` collection. Nothing enforces one
//! like per `(user, target)`: `toggle` looks the like up and then deletes or
//! creates it in a second request, so two concurrent toggles can leave a
//! duplicate behind. Each later toggle removes one of them.

// Use 3rd party
use chrono::Utc;
use log::{debug, info};
use serde_json::json;

use crate::client::*;
use crate::filter::Filter;
use crate::model::like::*;
use crate::model::track::Track;
use crate::model::Document;

pub const LIKED_TRACKS_LIMIT: u64 = 100;

#[derive(Debug, PartialEq)]
pub enum LikeToggle {
    /// A like was created, with this id
    Liked(String),
    Unliked,
}

pub struct Likes<'a>(pub &'a CrudClient);

impl Likes<'_> {
    pub async fn find(&self, user_id: &str, target: LikeTarget, target_id: &str) -> ClientResult<Option<Like>> {
        let options = ListOptions::new()
            .filter(like_filter(user_id, target, target_id))
            .limit(1);
        let page = self.0.list_documents::<Like>(Like::COLLECTION, &options).await?;
        Ok(page.first())
    }

    pub async fn is_liked(&self, user_id: &str, target: LikeTarget, target_id: &str) -> ClientResult<bool> {
        Ok(self.find(user_id, target, target_id).await?.is_some())
    }

    pub async fn toggle(&self, user_id: &str, target: LikeTarget, target_id: &str) -> ClientResult<LikeToggle> {
        let filter = like_filter(user_id, target, target_id);
        match self.0.delete_document_by_filter(Like::COLLECTION, &filter).await? {
            DeleteOutcome::Deleted(_) => {
                info!("{} unliked {} {}", user_id, target, target_id);
                Ok(LikeToggle::Unliked)
            }
            DeleteOutcome::NothingToDelete => {
                let like = Like {
                    id: None,
                    user_id: user_id.to_owned(),
                    target_type: target,
                    target_id: target_id.to_owned(),
                    created_at: Some(Utc::now().to_rfc3339()),
                };
                let id = self.0.create_document(Like::COLLECTION, &like).await?;
                info!("{} liked {} {}", user_id, target, target_id);
                Ok(LikeToggle::Liked(id))
            }
        }
    }

    pub async fn count(&self, target: LikeTarget, target_id: &str) -> ClientResult<u64> {
        let filter = json!({ "target_type": target, "target_id": target_id });
        self.0.count_documents(Like::COLLECTION, Some(&filter)).await
    }

    /// Tracks the user liked, skipping likes whose track was deleted.
    pub async fn liked_tracks(&self, user_id: &str) -> ClientResult<Vec<Track>> {
        let options = ListOptions::new()
            .filter(json!({ "user_id": user_id, "target_type": LikeTarget::Track }))
            .limit(LIKED_TRACKS_LIMIT);
        let likes = self.0.list_documents::<Like>(Like::COLLECTION, &options).await?.items;

        let mut tracks = Vec::with_capacity(likes.len());
        for like in likes {
            match self.0.get_document::<Track>(&like.target_id).await {
                Ok(track) => tracks.push(track),
                Err(ClientError::NotFound(_)) => debug!("liked track {} is gone", like.target_id),
                Err(err) => return Err(err),
            }
        }
        Ok(tracks)
    }
}

fn like_filter(user_id: &str, target: LikeTarget, target_id: &str) -> Filter {
    json!({
        "user_id": user_id,
        "target_type": target,
        "target_id": target_id,
    })
}
