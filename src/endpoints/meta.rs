//! Endpoint functions describing the store itself

// Use 3rd party
use serde::Deserialize;
use serde_json::Value;

use crate::client::*;

/// Distinct values of one field across a collection, as used for filter
/// dropdowns. Empty values are already dropped by the server.
#[derive(Debug, Deserialize)]
pub struct DistinctValues {
    pub collection: String,
    pub field: String,
    pub count: u64,
    pub values: Vec<Value>,
}

impl DistinctValues {
    /// Values rendered as strings, for display.
    pub fn labels(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|value| match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct CollectionNames {
    collections: Vec<String>,
}

pub struct Meta<'a>(pub &'a CrudClient);

impl Meta<'_> {
    /// Fails with `ClientError::NotFound` when the collection does not exist.
    pub async fn distinct_values(&self, collection: &str, field: &str) -> ClientResult<DistinctValues> {
        let result = self
            .0
            .get(&["crud", "meta", "get_field_from_all", collection, field], &[])
            .await?;
        CrudClient::convert_result::<DistinctValues>(&result)
    }

    pub async fn collection_names(&self) -> ClientResult<Vec<String>> {
        let result = self.0.get(&["crud", "meta", "list_collection_names"], &[]).await?;
        Ok(CrudClient::convert_result::<CollectionNames>(&result)?.collections)
    }

    pub async fn has_collection(&self, name: &str) -> ClientResult<bool> {
        Ok(self.collection_names().await?.iter().any(|collection| collection == name))
    }
}
