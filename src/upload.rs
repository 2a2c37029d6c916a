use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::Config;
use crate::models::ParseResult;

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = concat!("docparse-batch/", env!("CARGO_PKG_VERSION"));
const FILE_FIELD: &str = "file";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("{0}")]
    Transport(String),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("{0}")]
    Client(String),
}

// ── Client ───────────────────────────────────────────────────────────────────

pub fn build_client(config: &Config) -> Result<Client, UploadError> {
    let mut builder = reqwest::ClientBuilder::new().user_agent(USER_AGENT);

    if config.connect_timeout_secs > 0 {
        builder = builder.connect_timeout(Duration::from_secs(config.connect_timeout_secs));
    }
    if config.timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(config.timeout_secs));
    }

    builder
        .build()
        .map_err(|e| UploadError::Client(e.to_string()))
}

// ── Upload ───────────────────────────────────────────────────────────────────

/// Posts `path` as the multipart field `file` and decodes a 200 response.
pub async fn upload_document(
    client: &Client,
    url: &Url,
    path: &Path,
) -> Result<ParseResult, UploadError> {
    let content = tokio::fs::read(path).await.map_err(|source| UploadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| FILE_FIELD.to_string());
    let form = Form::new().part(FILE_FIELD, Part::bytes(content).file_name(file_name));

    let response = client
        .post(url.clone())
        .multipart(form)
        .send()
        .await
        .map_err(transport_error)?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
        return Err(UploadError::Status { status, body });
    }

    let body = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(|e| UploadError::Decode(e.to_string()))
}

fn transport_error(e: reqwest::Error) -> UploadError {
    if e.is_timeout() {
        UploadError::Transport(format!("TimeoutError: {}", e))
    } else if e.is_connect() {
        UploadError::Transport(format!("ConnectError: {}", e))
    } else {
        UploadError::Transport(format!("RequestError: {}", e))
    }
}
