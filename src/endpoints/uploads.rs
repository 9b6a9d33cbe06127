//! Endpoint functions for audio file storage

// Use 3rd party
use log::info;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::{ParseError, Url};

// Use built-in library
use std::path::Path;

use crate::client::*;

/// `{"url": "/static/audio/<name>.mp3", "filename": "<name>.mp3"}`
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UploadedAsset {
    pub url: String,
    pub filename: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DeletedAsset {
    pub deleted: bool,
    pub filename: String,
}

pub struct Uploads<'a>(pub &'a CrudClient);

impl Uploads<'_> {
    pub async fn upload_audio(&self, path: &Path) -> ClientResult<UploadedAsset> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ClientError::InvalidReference(path.display().to_string()))?
            .to_owned();
        let contents = tokio::fs::read(path).await?;
        self.upload_audio_bytes(&file_name, contents).await
    }

    pub async fn upload_audio_bytes(&self, file_name: &str, contents: Vec<u8>) -> ClientResult<UploadedAsset> {
        let size = contents.len();
        let part = Part::bytes(contents)
            .file_name(file_name.to_owned())
            .mime_str(mime_type_for_file(file_name))?;
        let form = Form::new().part("file", part);

        let result = self.0.post_multipart(&["upload", "audio"], form).await?;
        let asset = CrudClient::convert_result::<UploadedAsset>(&result)?;
        info!("uploaded {} ({} bytes) as {}", file_name, size, asset.url);
        Ok(asset)
    }

    /// Deletes a stored file given the url it was published under.
    pub async fn delete_by_url(&self, url: &str) -> ClientResult<DeletedAsset> {
        let filename = filename_from_url(self.0.base_url(), url)?;
        let result = self.0.delete(&["upload", "audio", "delete", &filename]).await?;
        CrudClient::convert_result::<DeletedAsset>(&result)
    }

    /// Absolute url of an uploaded asset, for storing on a track.
    pub fn absolute_url(&self, asset: &UploadedAsset) -> ClientResult<Url> {
        self.0
            .base_url()
            .join(&asset.url)
            .map_err(|_| ClientError::InvalidReference(asset.url.clone()))
    }
}

/// Stored file name: the last segment of the url path. Relative urls are
/// resolved against `base`.
pub fn filename_from_url(base: &Url, url: &str) -> ClientResult<String> {
    let invalid = || ClientError::InvalidReference(url.to_owned());

    let parsed = match Url::parse(url.trim()) {
        Ok(parsed) => parsed,
        Err(ParseError::RelativeUrlWithoutBase) => base.join(url.trim()).map_err(|_| invalid())?,
        Err(_) => return Err(invalid()),
    };

    let filename = parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .ok_or_else(invalid)?;
    Ok(filename.to_owned())
}

fn mime_type_for_file(file_name: &str) -> &'static str {
    match Path::new(file_name).extension().and_then(|ext| ext.to_str()) {
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("wav") => "audio/wav",
        Some("m4a") | Some("aac") => "audio/mp4",
        _ => "application/octet-stream",
    }
}
