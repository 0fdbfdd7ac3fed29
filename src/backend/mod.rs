//! Seam between the app and the hosted backend platform.
//!
//! Every call is one request/response round trip. Documents travel as raw
//! JSON; the feature modules (`auth`, `menu`) decode them into typed records.

use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use time::OffsetDateTime;

use crate::error::BackendError;

pub mod appwrite;
pub mod fake;

/// The platform's account record (only the parts this app reads).
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountSession {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub documents: Vec<Value>,
}

/// Document query predicates understood by the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal { attribute: String, values: Vec<Value> },
    Search { attribute: String, value: String },
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn search(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Search {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Wire form, e.g. `{"method":"equal","attribute":"accountId","values":["A1"]}`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Equal { attribute, values } => json!({
                "method": "equal",
                "attribute": attribute,
                "values": values,
            }),
            Self::Search { attribute, value } => json!({
                "method": "search",
                "attribute": attribute,
                "values": [value],
            }),
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn create_account(
        &self,
        account_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, BackendError>;

    async fn create_email_password_session(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccountSession, BackendError>;

    async fn get_account(&self) -> Result<Account, BackendError>;

    /// `session_id` may be `"current"`.
    async fn delete_session(&self, session_id: &str) -> Result<(), BackendError>;

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value, BackendError>;

    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList, BackendError>;

    async fn update_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value, BackendError>;

    async fn get_file_view(&self, bucket_id: &str, file_id: &str) -> Result<Bytes, BackendError>;

    /// URL of the generated initials avatar for `name`. No request is made.
    fn initials_avatar_url(&self, name: &str) -> String;

    /// URL under which a stored file can be viewed. No request is made.
    fn file_view_url(&self, bucket_id: &str, file_id: &str) -> String;
}

pub fn initials_avatar_url(endpoint: &str, project_id: &str, name: &str) -> String {
    let base = format!("{endpoint}/avatars/initials");
    match Url::parse_with_params(&base, &[("name", name), ("project", project_id)]) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{base}?name={name}&project={project_id}"),
    }
}

pub fn file_view_url(endpoint: &str, project_id: &str, bucket_id: &str, file_id: &str) -> String {
    format!("{endpoint}/storage/buckets/{bucket_id}/files/{file_id}/view?project={project_id}")
}

/// Decodes a raw platform document into a typed record.
pub fn decode_document<T: DeserializeOwned>(doc: Value) -> Result<T, BackendError> {
    serde_json::from_value(doc).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Client-side id in the platform's format: hex seconds, hex milliseconds
/// padded to five digits, then seven random hex digits.
pub fn unique_id() -> String {
    let now = OffsetDateTime::now_utc();
    let mut rng = rand::thread_rng();
    let padding: String = (0..7)
        .map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect();
    format!(
        "{:x}{:05x}{}",
        now.unix_timestamp(),
        now.millisecond(),
        padding
    )
}
