// Use 3rd party
use log::{debug, error, info, warn};
use reqwest::multipart::Form;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

// Use internal modules
use crate::config::ClientConfig;
use crate::filter::{Filter, Sort};
use crate::model::Document;
use crate::page::Page;

// Possible errors returned from the `soundsync` client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server error: {0}")]
    Api(#[from] ApiError),
    #[error("status code: {0}")]
    StatusCode(StatusCode),
    #[error("json parse error: {0}")]
    ParseJSON(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("invalid reference: {0}")]
    InvalidReference(String),
    #[error("invalid input: {0}")]
    Validation(String),
}

impl ClientError {
    async fn from_response(response: Response) -> Self {
        let status = response.status();
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .map(ErrorBody::into_detail);

        match (status, detail) {
            (StatusCode::NOT_FOUND, detail) => {
                Self::NotFound(detail.unwrap_or_else(|| status.to_string()))
            }
            (status, Some(detail)) => ApiError {
                status: status.as_u16(),
                detail,
            }
            .into(),
            (status, None) => status.into(),
        }
    }

    /// Network failures and non-success responses.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::Api(_) | Self::StatusCode(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Short message suitable for showing to an end user. Transport details
    /// stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Request(_) | Self::Api(_) | Self::StatusCode(_) => {
                "The server could not be reached, please try again later.".to_owned()
            }
            Self::ParseJSON(_) => "The server sent an unexpected response.".to_owned(),
            Self::Io(_) => "The file could not be read.".to_owned(),
            Self::NotFound(_) => "Nothing matching was found.".to_owned(),
            Self::Authentication(_) => "Incorrect identifier or password.".to_owned(),
            Self::InvalidReference(reference) => format!("Invalid file reference: {}", reference),
            Self::Validation(message) => message.clone(),
        }
    }
}

impl From<StatusCode> for ClientError {
    fn from(code: StatusCode) -> Self {
        Self::StatusCode(code)
    }
}

#[derive(Debug, Error)]
#[error("{status}: {detail}")]
pub struct ApiError {
    pub status: u16,
    pub detail: String,
}

// FastAPI error body: {"detail": "..."} or {"detail": [{...validation error...}]}
#[derive(Deserialize)]
struct ErrorBody {
    detail: Value,
}

impl ErrorBody {
    fn into_detail(self) -> String {
        match self.detail {
            Value::String(detail) => detail,
            other => other.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

// Envelopes

#[derive(Debug, Deserialize)]
pub struct Created {
    pub id: String,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Modified {
    pub modified: u64,
    pub message: Option<String>,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
pub struct Deleted {
    pub deleted: u64,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Count {
    count: u64,
}

#[derive(Debug, PartialEq)]
pub enum DeleteOutcome {
    Deleted(u64),
    NothingToDelete,
}

/// Response of the lookup-by-field endpoint. Depending on the server version
/// this is either `{"document": {...}}` or a paged list envelope.
#[derive(Debug)]
pub enum FieldLookup<T> {
    Document { document: T },
    Page(Page<T>),
}

impl<T: DeserializeOwned> FieldLookup<T> {
    /// The shape is picked by key, so a document that fails to decode is a
    /// parse error and never an empty page.
    fn parse(input: &str) -> ClientResult<Self> {
        let mut body = serde_json::from_str::<Value>(input)?;
        if let Some(document) = body.get_mut("document").map(Value::take) {
            let document = serde_json::from_value(document)?;
            return Ok(FieldLookup::Document { document });
        }
        if body.get("items").is_some() {
            return Ok(FieldLookup::Page(serde_json::from_value(body)?));
        }
        Err(ClientError::ParseJSON(serde::de::Error::custom(
            "lookup response has neither `document` nor `items`",
        )))
    }
}

impl<T> FieldLookup<T> {
    pub fn first(self) -> Option<T> {
        match self {
            FieldLookup::Document { document } => Some(document),
            FieldLookup::Page(page) => page.first(),
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            FieldLookup::Document { document } => vec![document],
            FieldLookup::Page(page) => page.items,
        }
    }
}

/// Query window and shaping for list requests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListOptions {
    pub filter: Option<Filter>,
    pub sort: Option<Sort>,
    pub projection: Option<Value>,
    pub skip: u64,
    /// `None` uses the configured default page size
    pub limit: Option<u64>,
}

impl ListOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter<F: Into<Option<Filter>>>(mut self, filter: F) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = if sort.is_empty() { None } else { Some(sort) };
        self
    }

    pub fn projection(mut self, projection: Value) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn to_query(&self, default_limit: u64) -> ClientResult<Vec<(&'static str, String)>> {
        let mut query = Vec::new();
        if let Some(filter) = &self.filter {
            query.push(("filter", serde_json::to_string(filter)?));
        }
        if let Some(sort) = &self.sort {
            query.push(("sort", serde_json::to_string(sort)?));
        }
        if let Some(projection) = &self.projection {
            query.push(("projection", serde_json::to_string(projection)?));
        }
        // Zero values are left for the server to default
        if self.skip > 0 {
            query.push(("skip", self.skip.to_string()));
        }
        let limit = self.limit.unwrap_or(default_limit);
        if limit > 0 {
            query.push(("limit", limit.to_string()));
        }
        Ok(query)
    }
}

pub(crate) enum Payload<'a> {
    Json(&'a Value),
    Multipart(Form),
}

// SoundSync API
pub struct CrudClient {
    client: Client,
    base_url: Url,
    config: ClientConfig,
}

impl CrudClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|err| {
            ClientError::Validation(format!("invalid base url {:?}: {}", config.base_url, err))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Validation(format!(
                "invalid base url {:?}",
                config.base_url
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins percent-encoded path segments onto the base url.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) async fn api_call(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        payload: Option<Payload<'_>>,
    ) -> ClientResult<Response> {
        let url = self.endpoint(segments);
        debug!("{} {} {:?}", method, url, query);

        let response = {
            let mut builder = self.client.request(method.clone(), url.clone());
            if !query.is_empty() {
                builder = builder.query(query);
            }

            // Only add payload when sent
            let builder = match payload {
                Some(Payload::Json(body)) => builder.json(body),
                Some(Payload::Multipart(form)) => builder.multipart(form),
                None => builder,
            };

            builder.send().await.map_err(|err| {
                error!("{} {} failed: {}", method, url, err);
                ClientError::from(err)
            })?
        };

        if response.status().is_success() {
            debug!("{} {} -> {}", method, url, response.status());
            Ok(response)
        } else {
            let err = ClientError::from_response(response).await;
            if err.is_not_found() {
                debug!("{} {} -> {}", method, url, err);
            } else {
                error!("{} {} -> {}", method, url, err);
            }
            Err(err)
        }
    }

    pub async fn get(&self, segments: &[&str], query: &[(&str, String)]) -> ClientResult<String> {
        self.api_call(Method::GET, segments, query, None).await?.text().await.map_err(Into::into)
    }

    pub async fn post(&self, segments: &[&str], payload: &Value) -> ClientResult<String> {
        self.api_call(Method::POST, segments, &[], Some(Payload::Json(payload))).await?.text().await.map_err(Into::into)
    }

    pub async fn put(&self, segments: &[&str], payload: &Value) -> ClientResult<String> {
        self.api_call(Method::PUT, segments, &[], Some(Payload::Json(payload))).await?.text().await.map_err(Into::into)
    }

    pub async fn delete(&self, segments: &[&str]) -> ClientResult<String> {
        self.api_call(Method::DELETE, segments, &[], None).await?.text().await.map_err(Into::into)
    }

    pub(crate) async fn post_multipart(&self, segments: &[&str], form: Form) -> ClientResult<String> {
        self.api_call(Method::POST, segments, &[], Some(Payload::Multipart(form))).await?.text().await.map_err(Into::into)
    }

    /// `GET /crud/{collection}`: one page of documents matching `options.filter`.
    pub async fn list_documents<T: DeserializeOwned>(
        &self,
        collection: &str,
        options: &ListOptions,
    ) -> ClientResult<Page<T>> {
        let query = options.to_query(self.config.default_limit)?;
        let result = self.get(&["crud", collection], &query).await?;
        Self::convert_result::<Page<T>>(&result)
    }

    /// `GET /crud/{collection}/by/{field}/{value}`. Only the projection and
    /// window of `options` are sent.
    pub async fn find_by_field<T: DeserializeOwned>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        options: &ListOptions,
    ) -> ClientResult<FieldLookup<T>> {
        let window = ListOptions {
            filter: None,
            sort: None,
            ..options.clone()
        };
        let query = window.to_query(self.config.default_limit)?;
        let result = self.get(&["crud", collection, "by", field, value], &query).await?;
        FieldLookup::parse(&result)
    }

    /// Fetches one typed document by `_id`.
    pub async fn get_document<D: Document>(&self, id: &str) -> ClientResult<D> {
        self.find_by_field::<D>(D::COLLECTION, "_id", id, &ListOptions::new().limit(1))
            .await?
            .first()
            .ok_or_else(|| ClientError::NotFound(format!("{}/{}", D::COLLECTION, id)))
    }

    pub async fn count_documents(&self, collection: &str, filter: Option<&Filter>) -> ClientResult<u64> {
        let query = ListOptions::new()
            .filter(filter.cloned())
            .limit(0)
            .to_query(0)?;
        let result = self.get(&["crud", collection, "count"], &query).await?;
        Ok(Self::convert_result::<Count>(&result)?.count)
    }

    /// Creates a document and returns the id assigned by the server.
    pub async fn create_document<D: Serialize + ?Sized>(&self, collection: &str, data: &D) -> ClientResult<String> {
        let payload = serde_json::to_value(data)?;
        let result = self.post(&["crud", collection], &payload).await?;
        let created = Self::convert_result::<Created>(&result)?;
        info!("created {}/{}", collection, created.id);
        Ok(created.id)
    }

    /// Partial update (`$set` semantics on the server). An `_id` in the
    /// update is dropped; ids never change.
    pub async fn update_document<D: Serialize + ?Sized>(
        &self,
        collection: &str,
        id: &str,
        update: &D,
    ) -> ClientResult<u64> {
        let payload = Self::update_payload(update)?;
        let result = self.put(&["crud", collection, "by", id], &payload).await?;
        let modified = Self::convert_result::<Modified>(&result)?.modified;
        info!("updated {}/{} (modified: {})", collection, id, modified);
        Ok(modified)
    }

    /// Deleting an id that does not exist reports zero deleted documents.
    pub async fn delete_document(&self, collection: &str, id: &str) -> ClientResult<Deleted> {
        match self.delete(&["crud", collection, "by", id]).await {
            Ok(result) => {
                let deleted = Self::convert_result::<Deleted>(&result)?;
                info!("deleted {}/{} (deleted: {})", collection, id, deleted.deleted);
                Ok(deleted)
            }
            Err(ClientError::NotFound(detail)) => {
                debug!("delete {}/{}: {}", collection, id, detail);
                Ok(Deleted::default())
            }
            Err(err) => Err(err),
        }
    }

    /// Deletes the first document matching `filter`. The lookup and the delete
    /// are two separate requests.
    pub async fn delete_document_by_filter(&self, collection: &str, filter: &Filter) -> ClientResult<DeleteOutcome> {
        let options = ListOptions::new().filter(filter.clone()).limit(1);
        let found = self.list_documents::<Value>(collection, &options).await?;

        let document = match found.first() {
            Some(document) => document,
            None => {
                debug!("delete from {} by {}: nothing to delete", collection, filter);
                return Ok(DeleteOutcome::NothingToDelete);
            }
        };

        let id = document_id(&document).ok_or_else(|| {
            ClientError::Validation(format!("document in {} has no _id", collection))
        })?;
        let deleted = self.delete_document(collection, &id).await?;
        Ok(DeleteOutcome::Deleted(deleted.deleted))
    }

    fn update_payload<D: Serialize + ?Sized>(update: &D) -> ClientResult<Value> {
        let mut payload = serde_json::to_value(update)?;
        let fields = payload
            .as_object_mut()
            .ok_or_else(|| ClientError::Validation("update must be an object".to_owned()))?;

        if fields.remove("_id").is_some() {
            warn!("dropping _id from update payload");
        }
        if fields.is_empty() {
            return Err(ClientError::Validation("update has no fields".to_owned()));
        }
        Ok(payload)
    }

    pub(crate) fn convert_result<'a, T: Deserialize<'a>>(input: &'a str) -> ClientResult<T> {
        serde_json::from_str::<T>(input).map_err(Into::into)
    }
}

/// `_id` of a raw document, either a plain string or an extended-JSON `{"$oid": ...}`.
pub fn document_id(document: &Value) -> Option<String> {
    match document.get("_id")? {
        Value::String(id) => Some(id.clone()),
        Value::Object(object) => object.get("$oid").and_then(Value::as_str).map(str::to_owned),
        _ => None,
    }
}
