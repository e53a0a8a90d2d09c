use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};

use crate::page_range::{decode, encode};
use crate::pdf::PdfDocument;
use crate::server::{split::resolve_pages, PagePolicy};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfExtractRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(
        description = "1-based page numbers in output order; repeats are kept (e.g., [3, 1, 1])"
    )]
    pub pages: Vec<i64>,
    #[schemars(description = "Output file path")]
    pub output: String,
    #[schemars(description = "Fail instead of skipping pages the document does not have (default: false)")]
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PagesNormalizeRequest {
    #[schemars(description = "Page range text (e.g., '1,3,5-7'); malformed parts are ignored")]
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get the number of pages in a PDF")]
    fn pdf_page_count(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match PdfDocument::open(&path) {
            Ok(doc) => {
                let result = PageCountResult {
                    page_count: doc.page_count(),
                    path,
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "Copy the given pages, in the given order, from a PDF into a new PDF file")]
    fn pdf_extract(&self, Parameters(req): Parameters<PdfExtractRequest>) -> String {
        let doc = match PdfDocument::open(&req.path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {:#}", e),
        };

        let policy = if req.strict {
            PagePolicy::Strict
        } else {
            PagePolicy::Permissive
        };
        let pages = match resolve_pages(&req.pages, doc.page_count(), policy) {
            Ok(p) => p,
            Err(e) => return format!("Error: {}", e),
        };

        let mut new_doc = match doc.extract_pages(&pages) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };

        if let Err(e) = PdfDocument::save(&mut new_doc, &req.output) {
            return format!("Error: {:#}", e);
        }

        let result = ExtractResult {
            output_path: req.output,
            page_count: pages.len() as u32,
            pages,
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "Parse page range text into a sorted page list and its shortest range form")]
    fn pages_normalize(&self, Parameters(req): Parameters<PagesNormalizeRequest>) -> String {
        let pages = decode(&req.text);
        let result = NormalizeResult {
            range: encode(&pages),
            pages: pages.into_iter().collect(),
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PageCountResult {
    pub path: String,
    pub page_count: u32,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExtractResult {
    pub output_path: String,
    pub page_count: u32,
    pub pages: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NormalizeResult {
    pub pages: Vec<u32>,
    pub range: String,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF page picking tools. Use pdf_page_count to size a document, pages_normalize \
                 to turn range text like '1,3,5-7' into page numbers, and pdf_extract to write \
                 a new PDF holding the chosen pages in order."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::{page_widths, sample_pdf};

    #[test]
    fn test_pages_normalize() {
        let server = PdfServer::new();
        let out = server.pages_normalize(Parameters(PagesNormalizeRequest {
            text: "7-5, 1,x,2".to_string(),
        }));
        let result: NormalizeResult = serde_json::from_str(&out).unwrap();
        assert_eq!(result.pages, vec![1, 2, 5, 6, 7]);
        assert_eq!(result.range, "1-2,5-7");
    }

    #[test]
    fn test_pdf_extract_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        std::fs::write(&input, sample_pdf(4)).unwrap();

        let server = PdfServer::new();
        let out = server.pdf_extract(Parameters(PdfExtractRequest {
            path: input.display().to_string(),
            pages: vec![4, 9, 2],
            output: output.display().to_string(),
            strict: false,
        }));
        let result: ExtractResult = serde_json::from_str(&out).unwrap();
        assert_eq!(result.pages, vec![4, 2]);
        assert_eq!(page_widths(&std::fs::read(&output).unwrap()), vec![400, 200]);
    }

    #[test]
    fn test_pdf_extract_strict_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, sample_pdf(2)).unwrap();

        let server = PdfServer::new();
        let out = server.pdf_extract(Parameters(PdfExtractRequest {
            path: input.display().to_string(),
            pages: vec![3],
            output: dir.path().join("out.pdf").display().to_string(),
            strict: true,
        }));
        assert!(out.starts_with("Error:"));
    }

    #[test]
    fn test_pdf_page_count_missing_file() {
        let server = PdfServer::new();
        let out = server.pdf_page_count(Parameters(PathRequest {
            path: "/nonexistent/file.pdf".to_string(),
        }));
        assert!(out.starts_with("Error:"));
    }
}
