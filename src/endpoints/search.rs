//! Endpoint functions related to search

// Use 3rd party
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::*;
use crate::debounce::Debouncer;
use crate::filter::{Filter, FilterBuilder};
use crate::page::Page;

pub const DEFAULT_SEARCH_FIELDS: [&str; 2] = ["title", "artist"];
pub const DEFAULT_SEARCH_LIMIT: u64 = 20;

/// Text search plus dropdown filters over one collection.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest {
    pub collection: String,
    pub query: String,
    pub search_fields: Vec<String>,
    pub filters: Vec<(String, Value)>,
    pub limit: u64,
}

impl SearchRequest {
    #[must_use]
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_owned(),
            query: String::new(),
            search_fields: DEFAULT_SEARCH_FIELDS.iter().map(|field| (*field).to_owned()).collect(),
            filters: Vec::new(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn query(mut self, query: &str) -> Self {
        self.query = query.to_owned();
        self
    }

    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.search_fields = fields.into_iter().map(|field| field.as_ref().to_owned()).collect();
        self
    }

    /// Dropdown selection; an empty value clears the constraint.
    pub fn filter<V: Into<Value>>(mut self, field: &str, value: V) -> Self {
        let value = value.into();
        match self.filters.iter_mut().find(|(name, _)| name == field) {
            Some(entry) => entry.1 = value,
            None => self.filters.push((field.to_owned(), value)),
        }
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn build_filter(&self) -> Option<Filter> {
        FilterBuilder::new()
            .query(&self.query)
            .search_fields(&self.search_fields)
            .fields(self.filters.iter().map(|(field, value)| (field, value.clone())))
            .build()
    }

    fn list_options(&self) -> ListOptions {
        ListOptions::new().filter(self.build_filter()).limit(self.limit)
    }
}

pub struct Search<'a>(pub &'a CrudClient);

impl Search<'_> {
    pub async fn run<T: DeserializeOwned>(&self, request: &SearchRequest) -> ClientResult<Page<T>> {
        self.0
            .list_documents::<T>(&request.collection, &request.list_options())
            .await
    }

    /// `None` when a newer search replaced this one during the debounce delay.
    pub async fn run_debounced<T: DeserializeOwned>(
        &self,
        debouncer: &Debouncer,
        request: &SearchRequest,
    ) -> Option<ClientResult<Page<T>>> {
        debouncer.run(|| self.run::<T>(request)).await
    }

    /// Dropdown options per field. A field whose values cannot be loaded gets
    /// no options instead of failing the whole lookup.
    pub async fn filter_options(&self, collection: &str, fields: &[&str]) -> Vec<(String, Vec<Value>)> {
        let mut options = Vec::with_capacity(fields.len());
        for field in fields {
            let values = match self.0.meta().distinct_values(collection, field).await {
                Ok(distinct) => distinct.values,
                Err(err) => {
                    warn!("failed to load filter values for {}.{}: {}", collection, field, err);
                    Vec::new()
                }
            };
            options.push(((*field).to_owned(), values));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{client, mock_request_success_from_file};
    use crate::model::track::Track;
    use mockito::{mock, Matcher};
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn request_filter() {
        let request = SearchRequest::new("tracks").query("Miles").filter("genre", "Jazz");
        assert_eq!(
            request.build_filter(),
            Some(json!({
                "$and": [
                    { "$or": [
                        { "title": { "$regex": "Miles", "$options": "i" } },
                        { "artist": { "$regex": "Miles", "$options": "i" } }
                    ] },
                    { "genre": "Jazz" }
                ]
            }))
        );
    }

    #[test]
    fn cleared_dropdown_is_ignored() {
        let request = SearchRequest::new("tracks").filter("genre", "Jazz").filter("genre", "");
        assert_eq!(request.build_filter(), None);
    }

    #[tokio::test]
    async fn run() {
        let _mock = mock_request_success_from_file(
            "GET",
            "/crud/tracks",
            vec![
                Matcher::UrlEncoded(
                    "filter".into(),
                    r#"{"$or":[{"title":{"$regex":"so","$options":"i"}}]}"#.into(),
                ),
                Matcher::UrlEncoded("limit".into(), "20".into()),
            ],
            "tests/files/tracks_by_genre.json",
        );

        let request = SearchRequest::new("tracks").query("so").search_fields(vec!["title"]);
        let page: Page<Track> = client().searches().run(&request).await.unwrap();
        assert_eq!(page.items[0].title.as_deref(), Some("So What"));
    }

    #[tokio::test]
    async fn run_debounced_skips_superseded() {
        let search = mock("GET", "/crud/artists")
            .match_query(Matcher::UrlEncoded(
                "filter".into(),
                r#"{"$or":[{"username":{"$regex":"miles","$options":"i"}}]}"#.into(),
            ))
            .with_body_from_file("tests/files/artists_page.json")
            .expect(1)
            .create();

        let client = client();
        let debouncer = Debouncer::new(Duration::from_millis(20));
        let first = SearchRequest::new("artists").search_fields(vec!["username"]).query("mile");
        let second = first.clone().query("miles");

        let searches = client.searches();
        let (first, second) = tokio::join!(
            searches.run_debounced::<Value>(&debouncer, &first),
            searches.run_debounced::<Value>(&debouncer, &second)
        );
        assert!(first.is_none());
        assert_eq!(second.unwrap().unwrap().total, 2);
        search.assert();
    }

    #[tokio::test]
    async fn filter_options_tolerates_failures() {
        let _genres = mock_request_success_from_file(
            "GET",
            "/crud/meta/get_field_from_all/tracks/genre",
            vec![],
            "tests/files/distinct_genres.json",
        );
        let _moods = mock("GET", "/crud/meta/get_field_from_all/tracks/mood")
            .match_query(Matcher::Any)
            .with_status(500)
            .create();

        let options = client().searches().filter_options("tracks", &["genre", "mood"]).await;
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].1.len(), 3);
        assert!(options[1].1.is_empty());
    }
}
