//! Session endpoints of the backend.
//!
//! | Operation | Method & Path |
//! |---|---|
//! | create session | `POST /api/session` |
//! | list files | `GET /api/session/{code}` |
//! | upload file | `POST /api/session/{code}/upload` |
//! | fetch file | `GET /api/session/{code}/file/{id}` or the item's `url` |

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::path::Path;
use sundora_core::{
    CreateSessionResponse, FileItem, ProgressFn, SessionCode, SessionListing, ShareError,
    ShareResult, UploadRequest,
};
use tokio::io::AsyncWriteExt;

use crate::body::UploadBody;
use crate::{check_status, network, ApiClient, SessionBackend};

pub const SESSION_PATH: &str = "/api/session";

pub fn session_path(code: &SessionCode) -> String {
    format!("{}/{}", SESSION_PATH, code)
}

pub fn upload_path(code: &SessionCode) -> String {
    format!("{}/{}/upload", SESSION_PATH, code)
}

impl ApiClient {
    /// Register a new session and return its code.
    pub async fn create_session(&self) -> ShareResult<SessionCode> {
        let response: CreateSessionResponse = self.post_empty(SESSION_PATH).await?;
        let raw = response.code.ok_or_else(|| {
            ShareError::InvalidResponse("session response has no code".to_string())
        })?;
        let code = SessionCode::parse(&raw).map_err(|_| {
            ShareError::InvalidResponse(format!("backend returned malformed code {:?}", raw))
        })?;

        tracing::info!(code = %code, "Session created");
        Ok(code)
    }

    /// List a session's files in server order.
    pub async fn list_files(&self, code: &SessionCode) -> ShareResult<Vec<FileItem>> {
        let listing: SessionListing = self.get(&session_path(code)).await?;
        Ok(listing.into_files())
    }

    /// Upload one file, streaming its base64 encoding from disk.
    pub async fn upload_file(
        &self,
        code: &SessionCode,
        request: &UploadRequest,
        progress: ProgressFn,
    ) -> ShareResult<()> {
        let file = tokio::fs::File::open(&request.source).await?;
        let body = UploadBody::new(request, file, progress.clone())?;
        let body_len = body.len();

        tracing::info!(
            code = %code,
            file_name = %request.file_name,
            file_type = %request.file_type,
            file_size = request.file_size,
            client_id = %request.client_id,
            body_len,
            "Uploading file"
        );

        progress(0.0);
        let response = self
            .client()
            .post(self.build_url(&upload_path(code)))
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body_len)
            .body(body.into_body())
            .send()
            .await
            .map_err(network)?;
        check_status(response).await?;

        tracing::info!(code = %code, file_name = %request.file_name, "Upload accepted");
        Ok(())
    }

    /// Fetch a file into `dest`. A failed transfer leaves no partial file behind.
    pub async fn download_file(&self, url: &str, dest: &Path) -> ShareResult<u64> {
        let response = self
            .client()
            .get(url)
            .send()
            .await
            .map_err(|e| ShareError::Download(e.to_string()))?;
        let response = check_status(response)
            .await
            .map_err(|e| ShareError::Download(e.to_string()))?;

        let mut file = tokio::fs::File::create(dest).await?;
        match write_stream(response, &mut file).await {
            Ok(written) => {
                tracing::debug!(url, dest = %dest.display(), written, "File downloaded");
                Ok(written)
            }
            Err(err) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(dest).await {
                    tracing::warn!(error = %remove_err, dest = %dest.display(), "Failed to remove partial download");
                }
                Err(err)
            }
        }
    }
}

async fn write_stream(response: reqwest::Response, file: &mut tokio::fs::File) -> ShareResult<u64> {
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ShareError::Download(e.to_string()))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

#[async_trait]
impl SessionBackend for ApiClient {
    fn base_url(&self) -> &str {
        ApiClient::base_url(self)
    }

    async fn create_session(&self) -> ShareResult<SessionCode> {
        ApiClient::create_session(self).await
    }

    async fn list_files(&self, code: &SessionCode) -> ShareResult<Vec<FileItem>> {
        ApiClient::list_files(self, code).await
    }

    async fn upload_file(
        &self,
        code: &SessionCode,
        request: &UploadRequest,
        progress: ProgressFn,
    ) -> ShareResult<()> {
        ApiClient::upload_file(self, code, request, progress).await
    }

    async fn download_file(&self, url: &str, dest: &Path) -> ShareResult<u64> {
        ApiClient::download_file(self, url, dest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::sync::{Arc, Mutex};
    use sundora_core::ClientConfig;

    fn client(server: &mockito::Server) -> ApiClient {
        ApiClient::new(server.url(), &ClientConfig::default()).unwrap()
    }

    fn code() -> SessionCode {
        SessionCode::parse("5555").unwrap()
    }

    #[tokio::test]
    async fn create_session_returns_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/session")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":"8888"}"#)
            .create_async()
            .await;

        let code = client(&server).create_session().await.unwrap();
        assert_eq!(code.as_str(), "8888");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_session_server_error_is_network_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/session")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = client(&server).create_session().await.unwrap_err();
        assert!(matches!(err, ShareError::Status { status: 500, ref body } if body == "boom"));
        assert_eq!(err.error_code(), "NETWORK_ERROR");
    }

    #[tokio::test]
    async fn create_session_rejects_missing_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/session")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let err = client(&server).create_session().await.unwrap_err();
        assert!(matches!(err, ShareError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn list_files_keeps_server_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/session/5555")
            .with_status(200)
            .with_body(
                r#"{"files":[
                    {"id":"1","name":"a.png","url":"/api/session/5555/file/1","type":"image/png"},
                    {"id":"2","name":"b.pdf","type":"application/pdf"}
                ]}"#,
            )
            .create_async()
            .await;

        let files = client(&server).list_files(&code()).await.unwrap();
        let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[tokio::test]
    async fn list_files_absent_array_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/session/5555")
            .with_status(200)
            .with_body(r#"{"code":"5555"}"#)
            .create_async()
            .await;

        let files = client(&server).list_files(&code()).await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn upload_posts_json_body_and_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello world").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/session/5555/upload")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "fileName": "notes.txt",
                "fileType": "text/plain",
                "fileSize": 11,
                "fileData": "data:text/plain;base64,aGVsbG8gd29ybGQ=",
                "clientId": "abc12345",
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress: ProgressFn = Arc::new(move |p| sink.lock().unwrap().push(p));

        let request = UploadRequest {
            file_name: "notes.txt".to_string(),
            file_type: "text/plain".to_string(),
            file_size: 11,
            client_id: "abc12345".to_string(),
            source: path,
        };
        client(&server)
            .upload_file(&code(), &request, progress)
            .await
            .unwrap();

        mock.assert_async().await;
        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&1.0));
    }

    #[tokio::test]
    async fn upload_rejection_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/session/5555/upload")
            .with_status(413)
            .with_body("too large")
            .create_async()
            .await;

        let request = UploadRequest {
            file_name: "a.bin".to_string(),
            file_type: "application/octet-stream".to_string(),
            file_size: 3,
            client_id: "abc12345".to_string(),
            source: path,
        };
        let err = client(&server)
            .upload_file(&code(), &request, Arc::new(|_| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, ShareError::Status { status: 413, .. }));
    }

    #[tokio::test]
    async fn download_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cat.png");

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/session/5555/file/7")
            .with_status(200)
            .with_body(vec![9u8; 2048])
            .create_async()
            .await;

        let api = client(&server);
        let url = api.build_url("/api/session/5555/file/7");
        let written = api.download_file(&url, &dest).await.unwrap();
        assert_eq!(written, 2048);
        assert_eq!(std::fs::read(&dest).unwrap(), vec![9u8; 2048]);
    }

    #[tokio::test]
    async fn download_not_found_is_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("gone.png");

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let api = client(&server);
        let err = api
            .download_file(&api.build_url("/missing"), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, ShareError::Download(_)));
        assert!(!dest.exists());
    }
}
