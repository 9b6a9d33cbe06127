//! Endpoint functions related to artists

use crate::client::*;
use crate::filter::FilterBuilder;
use crate::model::album::Album;
use crate::model::artist::Artist;
use crate::model::track::Track;
use crate::model::Document;
use crate::page::Page;

pub struct Artists<'a>(pub &'a CrudClient);

impl Artists<'_> {
    pub async fn get(&self, id: &str) -> ClientResult<Artist> {
        self.0.get_document::<Artist>(id).await
    }

    pub async fn list(&self, skip: u64, limit: u64) -> ClientResult<Page<Artist>> {
        let options = ListOptions::new().skip(skip).limit(limit);
        self.0.list_documents::<Artist>(Artist::COLLECTION, &options).await
    }

    /// Matches on username or genre, optionally restricted to one genre.
    pub async fn search(&self, term: &str, genre: Option<&str>) -> ClientResult<Vec<Artist>> {
        let mut filter = FilterBuilder::new()
            .query(term)
            .search_fields(vec!["username", "genre"]);
        if let Some(genre) = genre {
            filter = filter.field("genre", genre);
        }

        let options = ListOptions::new().filter(filter.build()).limit(20);
        let artists = self.0.list_documents::<Artist>(Artist::COLLECTION, &options).await?.items;
        Ok(artists)
    }

    pub async fn albums(&self, id: &str) -> ClientResult<Vec<Album>> {
        self.0.albums().by_artist(id).await
    }

    pub async fn tracks(&self, id: &str) -> ClientResult<Vec<Track>> {
        self.0.tracks().by_artist(id).await
    }
}
