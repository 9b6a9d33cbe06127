//! Mongo-style query documents built from search and filter inputs.
//!
//! The server receives these documents verbatim as JSON, so the shape produced
//! here is the wire shape:
//!
//! - text search: `{"$or": [{"title": {"$regex": "miles", "$options": "i"}}, ...]}`
//! - field filter: `{"genre": "Jazz"}`
//! - several clauses: `{"$and": [clause, clause, ...]}`
//!
//! An absent filter (`None`) matches every document.

// Use 3rd party
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

pub type Filter = Value;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterBuilder {
    query: Option<String>,
    search_fields: Vec<String>,
    fields: Vec<(String, Value)>,
}

impl FilterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text query matched against every search field.
    pub fn query(mut self, query: &str) -> Self {
        self.query = Some(query.to_owned());
        self
    }

    pub fn search_field(mut self, field: &str) -> Self {
        self.search_fields.push(field.to_owned());
        self
    }

    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.search_fields
            .extend(fields.into_iter().map(|field| field.as_ref().to_owned()));
        self
    }

    /// Exact-value constraint. Setting a field twice keeps its original position
    /// and replaces the value.
    pub fn field<V: Into<Value>>(mut self, field: &str, value: V) -> Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((field.to_owned(), value)),
        }
        self
    }

    pub fn fields<I, K, V>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        fields
            .into_iter()
            .fold(self, |builder, (field, value)| builder.field(field.as_ref(), value))
    }

    /// The query as typed, or `None` when it is blank.
    pub fn text_query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .filter(|query| !query.trim().is_empty())
    }

    /// Ordered clause list: the text-search `$or` group first, then one equality
    /// clause per non-empty field constraint in insertion order.
    pub fn clauses(&self) -> Vec<Value> {
        let mut clauses = Vec::new();

        if let Some(query) = self.text_query() {
            if !self.search_fields.is_empty() {
                let conditions = self
                    .search_fields
                    .iter()
                    .map(|field| regex_clause(field, query))
                    .collect::<Vec<_>>();
                clauses.push(json!({ "$or": conditions }));
            }
        }

        for (field, value) in &self.fields {
            if !is_empty_value(value) {
                clauses.push(eq_clause(field, value.clone()));
            }
        }

        clauses
    }

    pub fn build(&self) -> Option<Filter> {
        combine(self.clauses())
    }
}

/// `None` for no clauses, the clause itself for one, `$and` otherwise.
pub fn combine(mut clauses: Vec<Value>) -> Option<Filter> {
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(json!({ "$and": clauses })),
    }
}

/// Case-insensitive substring match on `field`.
pub fn regex_clause(field: &str, pattern: &str) -> Value {
    let mut condition = Map::new();
    condition.insert("$regex".to_owned(), Value::String(pattern.to_owned()));
    condition.insert("$options".to_owned(), Value::String("i".to_owned()));

    let mut clause = Map::new();
    clause.insert(field.to_owned(), Value::Object(condition));
    Value::Object(clause)
}

pub fn eq_clause<V: Into<Value>>(field: &str, value: V) -> Value {
    let mut clause = Map::new();
    clause.insert(field.to_owned(), value.into());
    Value::Object(clause)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_i8(self) -> i8 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

impl Serialize for SortOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

/// Sort keys, encoded as `[["field", 1], ["other", -1]]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Sort(Vec<(String, SortOrder)>);

impl Sort {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ascending(mut self, field: &str) -> Self {
        self.0.push((field.to_owned(), SortOrder::Ascending));
        self
    }

    pub fn descending(mut self, field: &str) -> Self {
        self.0.push((field.to_owned(), SortOrder::Descending));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Included fields, encoded as `{"field": 1, ...}`.
pub fn projection<I, S>(fields: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let map = fields
        .into_iter()
        .map(|field| (field.as_ref().to_owned(), Value::from(1)))
        .collect::<Map<String, Value>>();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_inputs_matches_everything() {
        assert_eq!(FilterBuilder::new().build(), None);
    }

    #[test]
    fn text_search_builds_or_group() {
        let filter = FilterBuilder::new()
            .query("Miles")
            .search_fields(vec!["title", "artist"])
            .build();

        assert_eq!(
            filter,
            Some(json!({
                "$or": [
                    { "title": { "$regex": "Miles", "$options": "i" } },
                    { "artist": { "$regex": "Miles", "$options": "i" } }
                ]
            }))
        );
    }

    #[test]
    fn single_field_filter_is_unwrapped() {
        let filter = FilterBuilder::new().field("genre", "Jazz").build();
        assert_eq!(filter, Some(json!({ "genre": "Jazz" })));
    }

    #[test]
    fn several_clauses_are_anded_in_insertion_order() {
        let filter = FilterBuilder::new()
            .field("genre", "Jazz")
            .query("blue")
            .search_field("title")
            .field("release_year", 1959)
            .build();

        assert_eq!(
            filter,
            Some(json!({
                "$and": [
                    { "$or": [ { "title": { "$regex": "blue", "$options": "i" } } ] },
                    { "genre": "Jazz" },
                    { "release_year": 1959 }
                ]
            }))
        );
    }

    #[test]
    fn empty_query_is_the_same_as_no_query() {
        let fields = vec!["title", "artist"];
        let empty = FilterBuilder::new().query("").search_fields(fields.clone()).build();
        let blank = FilterBuilder::new().query("   ").search_fields(fields.clone()).build();
        let absent = FilterBuilder::new().search_fields(fields).build();

        assert_eq!(empty, absent);
        assert_eq!(blank, absent);
        assert_eq!(absent, None);
    }

    #[test]
    fn query_is_sent_as_typed() {
        let filter = FilterBuilder::new().query(" blue ").search_field("title").build();
        assert_eq!(
            filter,
            Some(json!({ "$or": [ { "title": { "$regex": " blue ", "$options": "i" } } ] }))
        );
    }

    #[test]
    fn query_without_search_fields_adds_nothing() {
        let filter = FilterBuilder::new().query("Miles").field("genre", "Jazz").build();
        assert_eq!(filter, Some(json!({ "genre": "Jazz" })));
    }

    #[test]
    fn empty_field_values_are_skipped() {
        let filter = FilterBuilder::new()
            .field("genre", "")
            .field("mood", Value::Null)
            .field("explicit", false)
            .build();
        assert_eq!(filter, Some(json!({ "explicit": false })));
    }

    #[test]
    fn resetting_a_field_keeps_its_position() {
        let builder = FilterBuilder::new()
            .field("genre", "Jazz")
            .field("year", 1959)
            .field("genre", "Rock");
        assert_eq!(
            builder.clauses(),
            vec![json!({ "genre": "Rock" }), json!({ "year": 1959 })]
        );
    }

    #[test]
    fn wire_encoding_keeps_key_order() {
        let encoded = serde_json::to_string(&regex_clause("title", "x")).unwrap();
        assert_eq!(encoded, r#"{"title":{"$regex":"x","$options":"i"}}"#);
    }

    #[test]
    fn sort_and_projection_encoding() {
        let sort = Sort::new().descending("release_year").ascending("title");
        assert_eq!(
            serde_json::to_string(&sort).unwrap(),
            r#"[["release_year",-1],["title",1]]"#
        );
        assert_eq!(
            serde_json::to_string(&projection(vec!["title", "duration"])).unwrap(),
            r#"{"title":1,"duration":1}"#
        );
    }
}
