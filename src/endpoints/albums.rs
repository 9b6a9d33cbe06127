//! Endpoint functions relating to albums

// Use 3rd party
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{json, Value};

// Use built-in library
use std::path::PathBuf;

use crate::client::*;
use crate::filter::{eq_clause, Sort};
use crate::model::album::Album;
use crate::model::track::Track;
use crate::model::Document;

/// Track duration used when the author leaves it blank.
pub const DEFAULT_DURATION: u32 = 180;

/// A track to create together with its album.
#[derive(Clone, Debug, Default)]
pub struct TrackDraft {
    pub title: String,
    pub duration: Option<u32>,
    pub audio_url: Option<String>,
    /// Uploaded before the track is created; takes precedence over `audio_url`.
    pub audio_file: Option<PathBuf>,
    pub cover_url: Option<String>,
}

#[derive(Debug)]
pub struct AlbumCreated {
    pub album_id: String,
    pub track_ids: Vec<String>,
    /// Tracks created without audio because their upload failed
    pub upload_failures: Vec<(String, ClientError)>,
}

/// Album fields to change. Unset fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AlbumEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AlbumEdit {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.release_year.is_none() && self.description.is_none()
    }
}

/// One row of the edited tracklist. Rows with an `id` update that track,
/// rows without one create a new track.
#[derive(Clone, Debug, Default)]
pub struct TrackEdit {
    pub id: Option<String>,
    pub title: String,
    pub duration: Option<u32>,
    pub audio_url: Option<String>,
    pub cover_url: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct AlbumEdited {
    pub deleted: Vec<String>,
    pub updated: Vec<String>,
    pub created: Vec<String>,
    /// Track ids in the new play order
    pub tracklist: Vec<String>,
}

// Something created during `create_with_tracks`, undone if a later step fails
enum Step {
    Document(&'static str, String),
    Asset(String),
}

pub struct Albums<'a>(pub &'a CrudClient);

impl Albums<'_> {
    pub async fn get(&self, id: &str) -> ClientResult<Album> {
        self.0.get_document::<Album>(id).await
    }

    /// Newest first.
    pub async fn by_artist(&self, artist_id: &str) -> ClientResult<Vec<Album>> {
        let options = ListOptions::new()
            .filter(eq_clause("artist_id", artist_id))
            .sort(Sort::new().descending("release_year"));
        let albums = self.0.list_documents::<Album>(Album::COLLECTION, &options).await?.items;
        Ok(albums)
    }

    pub async fn tracks(&self, id: &str) -> ClientResult<Vec<Track>> {
        self.0.tracks().by_album(id).await
    }

    pub async fn update(&self, id: &str, update: &Value) -> ClientResult<u64> {
        self.0.update_document(Album::COLLECTION, id, update).await
    }

    /// Creates the album, then each track (uploading its audio file first when
    /// one is given), then links the track ids into the album's tracklist.
    ///
    /// If any step fails, everything created so far is deleted again in
    /// reverse order before the error is returned. A failed audio upload is
    /// not fatal: the track is created without audio and reported in
    /// `upload_failures`.
    pub async fn create_with_tracks(&self, album: &Album, tracks: &[TrackDraft]) -> ClientResult<AlbumCreated> {
        validate(album, tracks)?;

        let mut created = Vec::new();
        match self.create_steps(album, tracks, &mut created).await {
            Ok(result) => {
                info!(
                    "created album {} with {} track(s)",
                    result.album_id,
                    result.track_ids.len()
                );
                Ok(result)
            }
            Err(err) => {
                warn!("album creation failed, rolling back {} step(s): {}", created.len(), err);
                self.compensate(created).await;
                Err(err)
            }
        }
    }

    async fn create_steps(
        &self,
        album: &Album,
        tracks: &[TrackDraft],
        created: &mut Vec<Step>,
    ) -> ClientResult<AlbumCreated> {
        let payload = Album {
            id: None,
            title: album.title.as_deref().map(|title| title.trim().to_owned()),
            description: album.description.as_deref().map(|text| text.trim().to_owned()),
            tracklist: Vec::new(),
            ..album.clone()
        };
        let album_id = self.0.create_document(Album::COLLECTION, &payload).await?;
        created.push(Step::Document(Album::COLLECTION, album_id.clone()));

        let mut track_ids = Vec::with_capacity(tracks.len());
        let mut upload_failures = Vec::new();
        for draft in tracks {
            let mut audio_url = draft.audio_url.as_deref().unwrap_or("").trim().to_owned();

            if let Some(path) = &draft.audio_file {
                match self.0.uploads().upload_audio(path).await {
                    Ok(asset) => {
                        created.push(Step::Asset(asset.url.clone()));
                        audio_url = self.0.uploads().absolute_url(&asset)?.to_string();
                    }
                    Err(err) => {
                        warn!("upload failed for track {:?}: {}", draft.title, err);
                        upload_failures.push((draft.title.clone(), err));
                    }
                }
            }

            let track = Track {
                title: Some(draft.title.trim().to_owned()),
                artist_id: album.artist_id.clone(),
                album_id: Some(album_id.clone()),
                duration: Some(draft.duration.unwrap_or(DEFAULT_DURATION)),
                audio_url: Some(audio_url),
                cover_url: Some(draft.cover_url.as_deref().unwrap_or("").trim().to_owned()),
                ..Default::default()
            };
            let track_id = self.0.create_document(Track::COLLECTION, &track).await?;
            created.push(Step::Document(Track::COLLECTION, track_id.clone()));
            track_ids.push(track_id);
        }

        self.0
            .update_document(Album::COLLECTION, &album_id, &json!({ "tracklist": track_ids }))
            .await?;

        Ok(AlbumCreated {
            album_id,
            track_ids,
            upload_failures,
        })
    }

    async fn compensate(&self, created: Vec<Step>) {
        for step in created.into_iter().rev() {
            let result = match &step {
                Step::Document(collection, id) => {
                    self.0.delete_document(collection, id).await.map(|_| ())
                }
                Step::Asset(url) => self.0.uploads().delete_by_url(url).await.map(|_| ()),
            };
            if let Err(err) = result {
                match step {
                    Step::Document(collection, id) => {
                        warn!("could not roll back {}/{}: {}", collection, id, err)
                    }
                    Step::Asset(url) => warn!("could not roll back upload {}: {}", url, err),
                }
            }
        }
    }

    /// Saves an edited album: its own fields first, then the tracks. Stored
    /// tracks missing from `tracks` are deleted, rows with an id are updated
    /// and rows without one are created on the album. The tracklist is then
    /// rewritten in the order of `tracks`.
    ///
    /// Steps are applied one by one and stop at the first failure; nothing
    /// already applied is undone.
    pub async fn edit_with_tracks(
        &self,
        id: &str,
        edit: &AlbumEdit,
        tracks: &[TrackEdit],
    ) -> ClientResult<AlbumEdited> {
        if edit.title.as_deref().map_or(false, |title| title.trim().is_empty()) {
            return Err(ClientError::Validation("the album title is required".to_owned()));
        }
        if tracks.iter().any(|track| track.title.trim().is_empty()) {
            return Err(ClientError::Validation("every track needs a title".to_owned()));
        }

        let album = self.get(id).await?;
        if !edit.is_empty() {
            self.0.update_document(Album::COLLECTION, id, edit).await?;
        }

        let mut result = AlbumEdited::default();
        let kept: Vec<&str> = tracks.iter().filter_map(|track| track.id.as_deref()).collect();
        for track_id in self.stored_track_ids(&album, id).await? {
            if !kept.contains(&track_id.as_str()) {
                self.0.delete_document(Track::COLLECTION, &track_id).await?;
                result.deleted.push(track_id);
            }
        }

        for row in tracks {
            let title = Some(row.title.trim().to_owned());
            match &row.id {
                Some(track_id) => {
                    let update = Track {
                        title,
                        duration: row.duration,
                        audio_url: row.audio_url.clone(),
                        cover_url: row.cover_url.clone(),
                        ..Default::default()
                    };
                    self.0.update_document(Track::COLLECTION, track_id, &update).await?;
                    result.updated.push(track_id.clone());
                    result.tracklist.push(track_id.clone());
                }
                None => {
                    let track = Track {
                        title,
                        artist_id: album.artist_id.clone(),
                        album_id: Some(id.to_owned()),
                        duration: Some(row.duration.unwrap_or(DEFAULT_DURATION)),
                        audio_url: Some(row.audio_url.as_deref().unwrap_or("").trim().to_owned()),
                        cover_url: Some(row.cover_url.as_deref().unwrap_or("").trim().to_owned()),
                        ..Default::default()
                    };
                    let track_id = self.0.create_document(Track::COLLECTION, &track).await?;
                    result.created.push(track_id.clone());
                    result.tracklist.push(track_id);
                }
            }
        }

        self.0
            .update_document(Album::COLLECTION, id, &json!({ "tracklist": result.tracklist }))
            .await?;
        info!(
            "edited album {} ({} deleted, {} updated, {} created)",
            id,
            result.deleted.len(),
            result.updated.len(),
            result.created.len()
        );
        Ok(result)
    }

    // Tracklist entries first, then tracks pointing at the album that the
    // tracklist misses.
    async fn stored_track_ids(&self, album: &Album, id: &str) -> ClientResult<Vec<String>> {
        let mut track_ids = album.tracklist.clone();
        for track in self.tracks(id).await? {
            if let Some(track_id) = track.id {
                if !track_ids.contains(&track_id) {
                    debug!("track {} of album {} is not in its tracklist", track_id, id);
                    track_ids.push(track_id);
                }
            }
        }
        Ok(track_ids)
    }

    /// Deletes the album's tracks, then the album. Returns how many documents
    /// were deleted. Stops at the first failing delete.
    pub async fn delete_with_tracks(&self, id: &str) -> ClientResult<u64> {
        let album = self.get(id).await?;
        let track_ids = self.stored_track_ids(&album, id).await?;

        let mut deleted = 0;
        for track_id in &track_ids {
            deleted += self.0.delete_document(Track::COLLECTION, track_id).await?.deleted;
        }
        deleted += self.0.delete_document(Album::COLLECTION, id).await?.deleted;
        info!("deleted album {} ({} document(s))", id, deleted);
        Ok(deleted)
    }
}

fn validate(album: &Album, tracks: &[TrackDraft]) -> ClientResult<()> {
    if album.title.as_deref().map_or(true, |title| title.trim().is_empty()) {
        return Err(ClientError::Validation("the album title is required".to_owned()));
    }
    if album.artist_id.is_none() {
        return Err(ClientError::Validation("the album needs an artist".to_owned()));
    }
    if tracks.iter().any(|track| track.title.trim().is_empty()) {
        return Err(ClientError::Validation("every track needs a title".to_owned()));
    }
    Ok(())
}
