pub mod document;
pub mod raster;

pub use document::PdfDocument;
pub use raster::{FrameRasterizer, PageRasterizer, RgbaImage};

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("page {page} is out of range (1-{page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("malformed page tree: {0}")]
    PageTree(String),
}
