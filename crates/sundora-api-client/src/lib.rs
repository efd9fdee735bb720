//! HTTP gateway for the Sundora session backend.
//!
//! Provides a minimal client over the backend's REST endpoints (create session,
//! list files, upload, fetch file bytes) and the [`SessionBackend`] trait the
//! session workflows are written against, so they can run against a fake.

pub mod api;
mod body;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use sundora_core::{
    ClientConfig, FileItem, ProgressFn, SessionCode, ShareError, ShareResult, UploadRequest,
};

/// Operations the session workflows need from the backend.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Base URL that relative file paths are resolved against.
    fn base_url(&self) -> &str;

    async fn create_session(&self) -> ShareResult<SessionCode>;

    /// Files of a session in server order (oldest first).
    async fn list_files(&self, code: &SessionCode) -> ShareResult<Vec<FileItem>>;

    async fn upload_file(
        &self,
        code: &SessionCode,
        request: &UploadRequest,
        progress: ProgressFn,
    ) -> ShareResult<()>;

    /// Fetch `url` into `dest`, returning the number of bytes written.
    async fn download_file(&self, url: &str, dest: &Path) -> ShareResult<u64>;
}

/// HTTP client for the session backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String, config: &ClientConfig) -> ShareResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ShareError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> ShareResult<Self> {
        Self::new(config.api_url.clone(), config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ShareResult<T> {
        let url = self.build_url(path);
        let response = self.client.get(&url).send().await.map_err(network)?;
        parse_json(check_status(response).await?).await
    }

    /// POST without a body and deserialize response.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ShareResult<T> {
        let url = self.build_url(path);
        let response = self.client.post(&url).send().await.map_err(network)?;
        parse_json(check_status(response).await?).await
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

pub(crate) fn network(err: reqwest::Error) -> ShareError {
    ShareError::Network(err.to_string())
}

pub(crate) async fn check_status(response: Response) -> ShareResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ShareError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> ShareResult<T> {
    let bytes = response.bytes().await.map_err(network)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ShareError::InvalidResponse(format!("Failed to parse response as JSON: {}", e)))
}
