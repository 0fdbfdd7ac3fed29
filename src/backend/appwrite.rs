//! HTTP client for the hosted platform's REST API.
//!
//! Runs with the client role: the session established by
//! `create_email_password_session` lives in the cookie store and is sent on
//! every later request.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use super::{Account, AccountSession, Backend, DocumentList, Query};
use crate::config::{AppwriteConfig, HttpConfig};
use crate::error::BackendError;

const RESPONSE_FORMAT: &str = "1.7.0";

pub struct AppwriteClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
}

impl AppwriteClient {
    pub fn new(appwrite: &AppwriteConfig, http: &HttpConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-appwrite-project",
            header_value(&appwrite.project_id)?,
        );
        headers.insert(
            "x-appwrite-response-format",
            HeaderValue::from_static(RESPONSE_FORMAT),
        );
        headers.insert("x-appwrite-platform", header_value(&appwrite.platform)?);

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(Duration::from_secs(http.timeout_secs))
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;

        Ok(Self {
            http: client,
            endpoint: appwrite.endpoint.trim_end_matches('/').to_string(),
            project_id: appwrite.project_id.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn documents_path(database_id: &str, collection_id: &str) -> String {
        format!("/databases/{database_id}/collections/{collection_id}/documents")
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, BackendError> {
        let response = req
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "platform error response");
        Err(BackendError::from_response(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, BackendError> {
        let text = self
            .send(req)
            .await?
            .text()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, BackendError> {
    HeaderValue::from_str(raw).map_err(|e| BackendError::HttpClientBuild(e.to_string()))
}

#[async_trait]
impl Backend for AppwriteClient {
    async fn create_account(
        &self,
        account_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, BackendError> {
        let body = json!({
            "userId": account_id,
            "email": email,
            "password": password,
            "name": name,
        });
        self.send_json(self.http.post(self.url("/account")).json(&body))
            .await
    }

    async fn create_email_password_session(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccountSession, BackendError> {
        let body = json!({ "email": email, "password": password });
        self.send_json(
            self.http
                .post(self.url("/account/sessions/email"))
                .json(&body),
        )
        .await
    }

    async fn get_account(&self) -> Result<Account, BackendError> {
        self.send_json(self.http.get(self.url("/account"))).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), BackendError> {
        let path = format!("/account/sessions/{session_id}");
        self.send(self.http.delete(self.url(&path))).await?;
        Ok(())
    }

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value, BackendError> {
        let path = Self::documents_path(database_id, collection_id);
        let body = json!({ "documentId": document_id, "data": data });
        self.send_json(self.http.post(self.url(&path)).json(&body))
            .await
    }

    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList, BackendError> {
        let path = Self::documents_path(database_id, collection_id);
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_string()))
            .collect();
        self.send_json(self.http.get(self.url(&path)).query(&params))
            .await
    }

    async fn update_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value, BackendError> {
        let path = format!(
            "{}/{document_id}",
            Self::documents_path(database_id, collection_id)
        );
        let body = json!({ "data": data });
        self.send_json(self.http.patch(self.url(&path)).json(&body))
            .await
    }

    async fn get_file_view(&self, bucket_id: &str, file_id: &str) -> Result<Bytes, BackendError> {
        let path = format!("/storage/buckets/{bucket_id}/files/{file_id}/view");
        self.send(
            self.http
                .get(self.url(&path))
                .query(&[("project", self.project_id.as_str())]),
        )
        .await?
        .bytes()
        .await
        .map_err(|e| BackendError::Request(e.to_string()))
    }

    fn initials_avatar_url(&self, name: &str) -> String {
        super::initials_avatar_url(&self.endpoint, &self.project_id, name)
    }

    fn file_view_url(&self, bucket_id: &str, file_id: &str) -> String {
        super::file_view_url(&self.endpoint, &self.project_id, bucket_id, file_id)
    }
}
