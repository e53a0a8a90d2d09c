use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, info, warn};
use serde::Serialize;

use super::ServerConfig;
use crate::pdf::PdfDocument;

/// What to do with requested pages the document does not have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PagePolicy {
    /// Drop them and extract the rest.
    #[default]
    Permissive,
    /// Reject the request.
    Strict,
}

/// The two form fields of a split request, as received.
#[derive(Debug, Default)]
pub struct SplitUpload {
    pub file: Option<Vec<u8>>,
    /// JSON array of page numbers, e.g. `[3,1,1]`.
    pub pages: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("Missing PDF file")]
    MissingFile,
    #[error("Missing page selection")]
    MissingPages,
    #[error("Invalid page selection: {0}")]
    InvalidPages(String),
    #[error("PDF file exceeds the upload limit of {limit} bytes")]
    FileTooLarge { limit: usize },
    #[error("Malformed request: {0}")]
    Malformed(String),
    #[error("Error processing PDF file")]
    Processing { detail: String },
}

impl SplitError {
    pub fn kind(&self) -> &'static str {
        match self {
            SplitError::MissingFile => "missing_file",
            SplitError::MissingPages | SplitError::InvalidPages(_) => "invalid_pages",
            SplitError::FileTooLarge { .. } => "file_too_large",
            SplitError::Malformed(_) => "malformed_request",
            SplitError::Processing { .. } => "processing_failed",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SplitError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            SplitError::Processing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn processing(e: impl std::fmt::Display) -> Self {
        SplitError::Processing {
            detail: e.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub error: String,
}

impl IntoResponse for SplitError {
    fn into_response(self) -> Response {
        match &self {
            SplitError::Processing { detail } => error!("Error processing PDF: {}", detail),
            other => warn!("rejected split request: {}", other),
        }
        let body = ErrorBody {
            kind: self.kind(),
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Validate an upload and build the PDF holding the requested pages.
///
/// Pages are extracted in the order given, duplicates included.
pub fn split_pdf(upload: SplitUpload, config: &ServerConfig) -> Result<Vec<u8>, SplitError> {
    let file = match upload.file {
        Some(file) if !file.is_empty() => file,
        _ => return Err(SplitError::MissingFile),
    };
    if file.len() > config.max_upload_bytes {
        return Err(SplitError::FileTooLarge {
            limit: config.max_upload_bytes,
        });
    }

    let raw_pages = upload.pages.ok_or(SplitError::MissingPages)?;
    let requested = parse_pages(&raw_pages)?;

    let doc = PdfDocument::from_bytes(&file).map_err(SplitError::processing)?;
    let pages = resolve_pages(&requested, doc.page_count(), config.policy)?;

    let mut extracted = doc.extract_pages(&pages).map_err(SplitError::processing)?;
    let bytes = PdfDocument::to_bytes(&mut extracted).map_err(SplitError::processing)?;

    info!(
        "extracted {} page(s) from a {}-page document ({} bytes)",
        pages.len(),
        doc.page_count(),
        bytes.len()
    );
    Ok(bytes)
}

/// Parse the `pages` form field: a non-empty JSON array of integers.
pub fn parse_pages(raw: &str) -> Result<Vec<i64>, SplitError> {
    let pages: Vec<i64> = serde_json::from_str(raw)
        .map_err(|e| SplitError::InvalidPages(format!("expected a JSON array of integers ({})", e)))?;
    if pages.is_empty() {
        return Err(SplitError::InvalidPages("no pages selected".to_string()));
    }
    Ok(pages)
}

/// Check requested pages against a document with `total` pages.
pub fn resolve_pages(
    requested: &[i64],
    total: u32,
    policy: PagePolicy,
) -> Result<Vec<u32>, SplitError> {
    let mut pages = Vec::with_capacity(requested.len());
    let mut skipped = Vec::new();

    for &page in requested {
        match u32::try_from(page) {
            Ok(p) if (1..=total).contains(&p) => pages.push(p),
            _ => skipped.push(page),
        }
    }

    if !skipped.is_empty() {
        match policy {
            PagePolicy::Strict => {
                return Err(SplitError::InvalidPages(format!(
                    "pages {:?} are out of range (1-{})",
                    skipped, total
                )));
            }
            PagePolicy::Permissive => {
                warn!("skipping out-of-range pages {:?} (document has {})", skipped, total);
            }
        }
    }

    if pages.is_empty() {
        return Err(SplitError::InvalidPages(format!(
            "none of the selected pages exist in the document (1-{})",
            total
        )));
    }

    Ok(pages)
}
