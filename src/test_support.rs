//! Fake parsing endpoint and config helpers shared by the unit tests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use url::Url;

use crate::config::{Config, MatchMode, DEFAULT_MAX_SIZE};

pub enum Reply {
    Json(Value),
    Status(u16, &'static str),
    Raw(&'static str),
    Stall(Duration),
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub field: String,
    pub file_name: String,
    pub size: usize,
}

type ReplyFn = dyn Fn(&str) -> Reply + Send + Sync;

struct FakeState {
    uploads: Mutex<Vec<Upload>>,
    reply: Box<ReplyFn>,
}

pub struct FakeParser {
    addr: SocketAddr,
    state: Arc<FakeState>,
}

impl FakeParser {
    /// Starts a server whose response is chosen from the uploaded file name.
    pub async fn spawn<F>(reply: F) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        let state = Arc::new(FakeState {
            uploads: Mutex::new(Vec::new()),
            reply: Box::new(reply),
        });
        let app = Router::new()
            .route("/parse_document/docs", post(parse_endpoint))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/parse_document/docs", self.addr)).unwrap()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.state.uploads.lock().unwrap().clone()
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploads().into_iter().map(|u| u.file_name).collect()
    }
}

async fn parse_endpoint(State(state): State<Arc<FakeState>>, mut multipart: Multipart) -> Response {
    let mut upload = Upload {
        field: String::new(),
        file_name: String::new(),
        size: 0,
    };
    while let Ok(Some(field)) = multipart.next_field().await {
        upload.field = field.name().unwrap_or_default().to_string();
        upload.file_name = field.file_name().unwrap_or_default().to_string();
        upload.size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
    }

    let name = upload.file_name.clone();
    state.uploads.lock().unwrap().push(upload);

    match (state.reply)(&name) {
        Reply::Json(body) => (StatusCode::OK, Json(body)).into_response(),
        Reply::Status(code, body) => (StatusCode::from_u16(code).unwrap(), body).into_response(),
        Reply::Raw(body) => (StatusCode::OK, body).into_response(),
        Reply::Stall(delay) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, Json(json!({"text": "late"}))).into_response()
        }
    }
}

/// Serves one 502 whose body is cut short of its declared length.
pub async fn truncated_error_url() -> Url {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        // The multipart body ends with the closing boundary `--\r\n`.
        while !request.ends_with(b"--\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let _ = socket
            .write_all(b"HTTP/1.1 502 Bad Gateway\r\ncontent-length: 100\r\n\r\nshort")
            .await;
        let _ = socket.shutdown().await;
    });
    Url::parse(&format!("http://{}/parse_document/docs", addr)).unwrap()
}

/// URL of a local port with nothing listening on it.
pub fn closed_port_url() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}/parse_document/docs", addr)).unwrap()
}

pub fn test_config(url: Url, source_dir: &Path, result_dir: &Path) -> Config {
    Config {
        url,
        source_dir: source_dir.to_path_buf(),
        result_dir: result_dir.to_path_buf(),
        match_mode: MatchMode::Substring,
        max_size: DEFAULT_MAX_SIZE,
        timeout_secs: 30,
        connect_timeout_secs: 5,
    }
}
