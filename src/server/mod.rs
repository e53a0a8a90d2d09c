//! HTTP front end: upload a PDF plus a page list, get the extracted PDF back.

pub mod split;

use anyhow::{Context, Result};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use log::{debug, info};
use std::net::SocketAddr;
use std::sync::Arc;

pub use split::{split_pdf, PagePolicy, SplitError, SplitUpload};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Room for multipart boundaries and the `pages` field on top of the file.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub policy: PagePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            policy: PagePolicy::default(),
        }
    }
}

pub fn router(config: ServerConfig) -> Router {
    let body_limit = config.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES);
    Router::new()
        .route("/api/pdf/split", post(split_handler))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(Arc::new(config))
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    info!(
        "Server is running on {} (upload limit {} bytes, {:?} page policy)",
        listener.local_addr()?,
        config.max_upload_bytes,
        config.policy
    );

    axum::serve(listener, router(config))
        .await
        .context("HTTP server error")?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn split_handler(
    State(config): State<Arc<ServerConfig>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, SplitError> {
    let mut multipart = multipart.map_err(|e| SplitError::Malformed(e.body_text()))?;
    let upload = read_upload(&mut multipart, config.max_upload_bytes).await?;

    let pdf = tokio::task::spawn_blocking(move || split_pdf(upload, &config))
        .await
        .map_err(|e| SplitError::Processing {
            detail: e.to_string(),
        })??;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"split.pdf\""),
        ],
        pdf,
    )
        .into_response())
}

async fn read_upload(multipart: &mut Multipart, limit: usize) -> Result<SplitUpload, SplitError> {
    let to_split_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            SplitError::FileTooLarge { limit }
        } else {
            SplitError::Malformed(e.body_text())
        }
    };

    let mut upload = SplitUpload::default();
    while let Some(field) = multipart.next_field().await.map_err(to_split_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let bytes = field.bytes().await.map_err(to_split_error)?;
                if bytes.len() > limit {
                    return Err(SplitError::FileTooLarge { limit });
                }
                upload.file = Some(bytes.to_vec());
            }
            Some("pages") => {
                upload.pages = Some(field.text().await.map_err(to_split_error)?);
            }
            other => debug!("ignoring form field {:?}", other),
        }
    }
    Ok(upload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::{page_widths, sample_pdf};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const BOUNDARY: &str = "pagepick-test-boundary";

    async fn start(config: ServerConfig) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(config)).await.unwrap();
        });
        addr
    }

    fn form(file: Option<&[u8]>, pages: Option<&str>) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(file) = file {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"in.pdf\"\r\n\
                     Content-Type: application/pdf\r\n\r\n",
                    BOUNDARY
                )
                .as_bytes(),
            );
            body.extend_from_slice(file);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(pages) = pages {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"pages\"\r\n\r\n{}\r\n",
                    BOUNDARY, pages
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    /// Send a raw HTTP/1.1 request and split the response into status code
    /// and body.
    async fn send_form(addr: SocketAddr, body: &[u8]) -> (u16, Vec<u8>) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let head = format!(
            "POST /api/pdf/split HTTP/1.1\r\nHost: localhost\r\n\
             Content-Type: multipart/form-data; boundary={}\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n",
            BOUNDARY,
            body.len()
        );
        stream.write_all(head.as_bytes()).await.unwrap();
        stream.write_all(body).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();

        let split = response
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .unwrap();
        let head = String::from_utf8_lossy(&response[..split]).to_string();
        let status = head.split_whitespace().nth(1).unwrap().parse().unwrap();
        (status, response[split + 4..].to_vec())
    }

    #[tokio::test]
    async fn test_split_round_trip() {
        let addr = start(ServerConfig::default()).await;
        let (status, body) = send_form(addr, &form(Some(&sample_pdf(5)), Some("[3,1,1]"))).await;
        assert_eq!(status, 200);
        assert_eq!(page_widths(&body), vec![300, 100, 100]);
    }

    #[tokio::test]
    async fn test_missing_file_is_structured_400() {
        let addr = start(ServerConfig::default()).await;
        let (status, body) = send_form(addr, &form(None, Some("[1]"))).await;
        assert_eq!(status, 400);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "missing_file");
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let addr = start(ServerConfig {
            max_upload_bytes: 64,
            ..ServerConfig::default()
        })
        .await;
        let (status, body) = send_form(addr, &form(Some(&sample_pdf(2)), Some("[1]"))).await;
        assert_eq!(status, 413);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "file_too_large");
    }
}
