//! Endpoint functions related to playlists

// Use 3rd party
use chrono::Utc;
use log::{debug, info};
use serde_json::json;

use crate::client::*;
use crate::filter::eq_clause;
use crate::model::playlist::*;
use crate::model::track::*;
use crate::model::Document;

pub struct Playlists<'a>(pub &'a CrudClient);

impl Playlists<'_> {
    pub async fn get(&self, id: &str) -> ClientResult<Playlist> {
        self.0.get_document::<Playlist>(id).await
    }

    pub async fn user_playlists(&self, user_id: &str) -> ClientResult<Vec<Playlist>> {
        let options = ListOptions::new().filter(eq_clause("user_id", user_id)).limit(50);
        let playlists = self.0.list_documents::<Playlist>(Playlist::COLLECTION, &options).await?.items;
        Ok(playlists)
    }

    pub async fn create(&self, user_id: &str, name: &str) -> ClientResult<Playlist> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("a playlist needs a name".to_owned()));
        }

        let mut playlist = Playlist {
            id: None,
            name: Some(name.to_owned()),
            user_id: Some(user_id.to_owned()),
            track_ids: Vec::new(),
            created_at: Some(Utc::now().to_rfc3339()),
        };
        let id = self.0.create_document(Playlist::COLLECTION, &playlist).await?;
        playlist.id = Some(id);
        Ok(playlist)
    }

    /// Tracks of the playlist in order. Ids whose track no longer exists are
    /// skipped.
    pub async fn tracks(&self, playlist: &Playlist) -> ClientResult<Vec<Track>> {
        let mut tracks = Vec::with_capacity(playlist.track_ids.len());
        for track_id in &playlist.track_ids {
            let options = ListOptions::new().filter(eq_clause("_id", track_id.as_str())).limit(1);
            let page = self.0.list_documents::<Track>(Track::COLLECTION, &options).await?;
            match page.first() {
                Some(track) => tracks.push(track),
                None => debug!("playlist track {} is gone", track_id),
            }
        }
        Ok(tracks)
    }

    /// Returns `false` when the track was already in the playlist.
    pub async fn add_track(&self, id: &str, track_id: &str) -> ClientResult<bool> {
        let mut playlist = self.get(id).await?;
        if playlist.contains(track_id) {
            return Ok(false);
        }

        playlist.track_ids.push(track_id.to_owned());
        self.save_tracks(id, &playlist.track_ids).await?;
        info!("added track {} to playlist {}", track_id, id);
        Ok(true)
    }

    /// Returns `false` when the track was not in the playlist.
    pub async fn remove_track(&self, id: &str, track_id: &str) -> ClientResult<bool> {
        let mut playlist = self.get(id).await?;
        if !playlist.contains(track_id) {
            return Ok(false);
        }

        playlist.track_ids.retain(|existing| existing != track_id);
        self.save_tracks(id, &playlist.track_ids).await?;
        info!("removed track {} from playlist {}", track_id, id);
        Ok(true)
    }

    pub async fn rename(&self, id: &str, name: &str) -> ClientResult<u64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("a playlist needs a name".to_owned()));
        }
        self.0.update_document(Playlist::COLLECTION, id, &json!({ "name": name })).await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<Deleted> {
        self.0.delete_document(Playlist::COLLECTION, id).await
    }

    async fn save_tracks(&self, id: &str, track_ids: &[String]) -> ClientResult<u64> {
        self.0
            .update_document(Playlist::COLLECTION, id, &json!({ "track_ids": track_ids }))
            .await
    }
}
