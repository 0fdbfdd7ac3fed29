//! In-memory stand-in for the hosted platform.
//!
//! Mirrors the platform's observable behaviour closely enough for the store
//! and gateway tests: one active session at a time, system `$` fields stamped
//! on documents, and the platform's error messages for the common failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use super::{Account, AccountSession, Backend, DocumentList, Query};
use crate::error::BackendError;

struct FakeAccount {
    account: Account,
    password: String,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<FakeAccount>,
    current: Option<String>,
    documents: HashMap<(String, String), Vec<Value>>,
    files: HashMap<(String, String), Bytes>,
    failure: Option<BackendError>,
    sequence: u64,
    sessions_created: u64,
}

pub struct FakeBackend {
    endpoint: String,
    project_id: String,
    stalled: AtomicBool,
    inner: Mutex<Inner>,
}

fn api_error(status: u16, kind: &str, message: &str) -> BackendError {
    BackendError::Api {
        status,
        kind: kind.into(),
        message: message.into(),
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

fn matches(doc: &Value, query: &Query) -> bool {
    match query {
        Query::Equal { attribute, values } => match doc.get(attribute) {
            Some(Value::Array(items)) => items.iter().any(|item| values.contains(item)),
            Some(field) => values.contains(field),
            None => false,
        },
        Query::Search { attribute, value } => doc
            .get(attribute)
            .and_then(Value::as_str)
            .map_or(false, |field| {
                field.to_lowercase().contains(&value.to_lowercase())
            }),
    }
}

impl FakeBackend {
    pub fn new(endpoint: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            stalled: AtomicBool::new(false),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Every following call fails with `failure` until cleared with `None`.
    pub async fn set_failure(&self, failure: Option<BackendError>) {
        self.inner.lock().await.failure = failure;
    }

    /// While stalled, account lookups never complete.
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    /// Inserts a document as-is, bypassing system field stamping.
    pub async fn seed_document(&self, database_id: &str, collection_id: &str, doc: Value) {
        self.inner
            .lock()
            .await
            .documents
            .entry((database_id.into(), collection_id.into()))
            .or_default()
            .push(doc);
    }

    pub async fn put_file(&self, bucket_id: &str, file_id: &str, body: Bytes) {
        self.inner
            .lock()
            .await
            .files
            .insert((bucket_id.into(), file_id.into()), body);
    }

    pub async fn documents(&self, database_id: &str, collection_id: &str) -> Vec<Value> {
        self.inner
            .lock()
            .await
            .documents
            .get(&(database_id.to_string(), collection_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn current_account_id(&self) -> Option<String> {
        self.inner.lock().await.current.clone()
    }

    pub async fn sessions_created(&self) -> u64 {
        self.inner.lock().await.sessions_created
    }

    fn check(inner: &Inner) -> Result<(), BackendError> {
        match &inner.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn create_account(
        &self,
        account_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, BackendError> {
        let mut inner = self.inner.lock().await;
        Self::check(&inner)?;
        if password.len() < 8 {
            return Err(api_error(
                400,
                "general_argument_invalid",
                "Invalid `password` param: Password must be between 8 and 256 characters long.",
            ));
        }
        if inner
            .accounts
            .iter()
            .any(|a| a.account.id == account_id || a.account.email == email)
        {
            return Err(api_error(
                409,
                "user_already_exists",
                "A user with the same id, email, or phone already exists in this project.",
            ));
        }
        let account = Account {
            id: account_id.into(),
            name: name.into(),
            email: email.into(),
        };
        inner.accounts.push(FakeAccount {
            account: account.clone(),
            password: password.into(),
        });
        Ok(account)
    }

    async fn create_email_password_session(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccountSession, BackendError> {
        let mut inner = self.inner.lock().await;
        Self::check(&inner)?;
        if inner.current.is_some() {
            return Err(api_error(
                401,
                "user_session_already_exists",
                "Creation of a session is prohibited when a session is active.",
            ));
        }
        let account_id = inner
            .accounts
            .iter()
            .find(|a| a.account.email == email && a.password == password)
            .map(|a| a.account.id.clone())
            .ok_or_else(|| {
                api_error(
                    401,
                    "user_invalid_credentials",
                    "Invalid credentials. Please check the email and password.",
                )
            })?;
        inner.sessions_created += 1;
        inner.current = Some(account_id.clone());
        Ok(AccountSession {
            id: format!("session-{}", inner.sessions_created),
            user_id: account_id,
        })
    }

    async fn get_account(&self) -> Result<Account, BackendError> {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let inner = self.inner.lock().await;
        Self::check(&inner)?;
        let current = inner.current.as_deref().ok_or_else(|| {
            api_error(
                401,
                "general_unauthorized_scope",
                "User (role: guests) missing scope (account)",
            )
        })?;
        inner
            .accounts
            .iter()
            .find(|a| a.account.id == current)
            .map(|a| a.account.clone())
            .ok_or_else(|| api_error(404, "user_not_found", "User with the requested ID could not be found."))
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().await;
        Self::check(&inner)?;
        if inner.current.is_none() {
            return Err(api_error(
                401,
                "general_unauthorized_scope",
                "User (role: guests) missing scope (account)",
            ));
        }
        if session_id != "current" && !session_id.starts_with("session-") {
            return Err(api_error(
                404,
                "user_session_not_found",
                "The current user session could not be found.",
            ));
        }
        inner.current = None;
        Ok(())
    }

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value, BackendError> {
        let mut inner = self.inner.lock().await;
        Self::check(&inner)?;
        let Value::Object(fields) = data else {
            return Err(api_error(
                400,
                "document_invalid_structure",
                "Invalid document structure: data must be an object",
            ));
        };
        let key = (database_id.to_string(), collection_id.to_string());
        let exists = inner
            .documents
            .get(&key)
            .map_or(false, |docs| docs.iter().any(|d| d["$id"] == document_id));
        if exists {
            return Err(api_error(
                409,
                "document_already_exists",
                "Document with the requested ID already exists.",
            ));
        }

        inner.sequence += 1;
        let stamp = now_rfc3339();
        let mut doc = Map::new();
        doc.insert("$id".into(), json!(document_id));
        doc.insert("$collectionId".into(), json!(collection_id));
        doc.insert("$databaseId".into(), json!(database_id));
        doc.insert("$createdAt".into(), json!(stamp));
        doc.insert("$updatedAt".into(), json!(stamp));
        doc.insert("$permissions".into(), json!([]));
        doc.insert("$sequence".into(), json!(inner.sequence));
        doc.extend(fields);

        let doc = Value::Object(doc);
        inner.documents.entry(key).or_default().push(doc.clone());
        Ok(doc)
    }

    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList, BackendError> {
        let inner = self.inner.lock().await;
        Self::check(&inner)?;
        let documents: Vec<Value> = inner
            .documents
            .get(&(database_id.to_string(), collection_id.to_string()))
            .map(|docs| {
                docs.iter()
                    .filter(|d| queries.iter().all(|q| matches(d, q)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(DocumentList {
            total: documents.len() as u64,
            documents,
        })
    }

    async fn update_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value, BackendError> {
        let mut inner = self.inner.lock().await;
        Self::check(&inner)?;
        let doc = inner
            .documents
            .get_mut(&(database_id.to_string(), collection_id.to_string()))
            .and_then(|docs| docs.iter_mut().find(|d| d["$id"] == document_id))
            .ok_or_else(|| {
                api_error(
                    404,
                    "document_not_found",
                    "Document with the requested ID could not be found.",
                )
            })?;
        if let (Value::Object(target), Value::Object(fields)) = (&mut *doc, data) {
            target.extend(fields);
            target.insert("$updatedAt".into(), json!(now_rfc3339()));
        }
        Ok(doc.clone())
    }

    async fn get_file_view(&self, bucket_id: &str, file_id: &str) -> Result<Bytes, BackendError> {
        let inner = self.inner.lock().await;
        Self::check(&inner)?;
        inner
            .files
            .get(&(bucket_id.to_string(), file_id.to_string()))
            .cloned()
            .ok_or_else(|| {
                api_error(
                    404,
                    "storage_file_not_found",
                    "The requested file could not be found.",
                )
            })
    }

    fn initials_avatar_url(&self, name: &str) -> String {
        super::initials_avatar_url(&self.endpoint, &self.project_id, name)
    }

    fn file_view_url(&self, bucket_id: &str, file_id: &str) -> String {
        super::file_view_url(&self.endpoint, &self.project_id, bucket_id, file_id)
    }
}
