//! Endpoint functions related to tracks

// Use 3rd party
use serde_json::Value;

use crate::client::*;
use crate::filter::{eq_clause, FilterBuilder};
use crate::model::track::*;
use crate::model::Document;

pub const SEARCH_LIMIT: u64 = 20;

pub struct Tracks<'a>(pub &'a CrudClient);

impl Tracks<'_> {
    pub async fn get(&self, id: &str) -> ClientResult<Track> {
        self.0.get_document::<Track>(id).await
    }

    /// Case-insensitive match on title or artist name. An empty term returns
    /// no tracks without asking the server.
    pub async fn search(&self, term: &str) -> ClientResult<Vec<Track>> {
        let filter = FilterBuilder::new()
            .query(term)
            .search_fields(vec!["title", "artist"])
            .build();
        if filter.is_none() {
            return Ok(Vec::new());
        }

        let options = ListOptions::new().filter(filter).limit(SEARCH_LIMIT);
        let tracks = self.0.list_documents::<Track>(Track::COLLECTION, &options).await?.items;
        Ok(tracks)
    }

    pub async fn by_album(&self, album_id: &str) -> ClientResult<Vec<Track>> {
        self.by_field("album_id", album_id).await
    }

    pub async fn by_artist(&self, artist_id: &str) -> ClientResult<Vec<Track>> {
        self.by_field("artist_id", artist_id).await
    }

    async fn by_field(&self, field: &str, value: &str) -> ClientResult<Vec<Track>> {
        let options = ListOptions::new().filter(eq_clause(field, value));
        let tracks = self.0.list_documents::<Track>(Track::COLLECTION, &options).await?.items;
        Ok(tracks)
    }

    pub async fn create(&self, track: &Track) -> ClientResult<String> {
        if track.title.as_deref().map_or(true, |title| title.trim().is_empty()) {
            return Err(ClientError::Validation("a track needs a title".to_owned()));
        }
        self.0.create_document(Track::COLLECTION, track).await
    }

    pub async fn update(&self, id: &str, update: &Value) -> ClientResult<u64> {
        self.0.update_document(Track::COLLECTION, id, update).await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<Deleted> {
        self.0.delete_document(Track::COLLECTION, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{client, mock_request_success_from_file};
    use mockito::{mock, Matcher};

    #[tokio::test]
    async fn get() {
        let _mock = mock_request_success_from_file(
            "GET",
            "/crud/tracks/by/_id/t-100",
            vec![],
            "tests/files/track_document.json",
        );

        let result: Track = client().tracks().get("t-100").await.unwrap();
        assert_eq!(result.title.as_deref(), Some("X"));
        assert_eq!(result.duration, Some(200));
    }

    #[tokio::test]
    async fn search() {
        let _mock = mock_request_success_from_file(
            "GET",
            "/crud/tracks",
            vec![
                Matcher::UrlEncoded(
                    "filter".into(),
                    r#"{"$or":[{"title":{"$regex":"Miles","$options":"i"}},{"artist":{"$regex":"Miles","$options":"i"}}]}"#.into(),
                ),
                Matcher::UrlEncoded("limit".into(), "20".into()),
            ],
            "tests/files/tracks_last_page.json",
        );

        let result: Vec<Track> = client().tracks().search("Miles").await.unwrap();
        assert_eq!(result.len(), 7);
    }

    #[tokio::test]
    async fn search_empty_term() {
        let unexpected = mock("GET", "/crud/tracks")
            .match_query(Matcher::Any)
            .expect(0)
            .create();

        let result = client().tracks().search("  ").await.unwrap();
        assert!(result.is_empty());
        unexpected.assert();
    }

    #[tokio::test]
    async fn by_album() {
        let _mock = mock_request_success_from_file(
            "GET",
            "/crud/tracks",
            vec![Matcher::UrlEncoded("filter".into(), r#"{"album_id":"a-1"}"#.into())],
            "tests/files/tracks_last_page.json",
        );

        let result = client().tracks().by_album("a-1").await.unwrap();
        assert!(result.iter().all(|track| track.album_id.as_deref() == Some("a-1")));
    }

    #[tokio::test]
    async fn create_requires_title() {
        let track = Track {
            duration: Some(200),
            ..Default::default()
        };
        let err = client().tracks().create(&track).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
