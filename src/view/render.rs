use anyhow::Result;
use log::debug;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::DocumentId;
use crate::pdf::{PageRasterizer, PdfDocument, RgbaImage};

/// Output of the render pipeline. Every event names the document it belongs
/// to so a view can drop results for a document it no longer shows.
#[derive(Debug)]
pub enum RenderEvent {
    Started {
        doc: DocumentId,
        total: u32,
    },
    Page {
        doc: DocumentId,
        page: u32,
        image: RgbaImage,
    },
    Finished {
        doc: DocumentId,
        total: u32,
    },
    Failed {
        doc: DocumentId,
        message: String,
    },
}

impl RenderEvent {
    pub fn document(&self) -> DocumentId {
        match self {
            RenderEvent::Started { doc, .. }
            | RenderEvent::Page { doc, .. }
            | RenderEvent::Finished { doc, .. }
            | RenderEvent::Failed { doc, .. } => *doc,
        }
    }
}

/// Render every page of `bytes` in ascending order, one page at a time.
///
/// Stops quietly once the receiving side of `tx` is gone.
pub async fn render_document<R>(
    rasterizer: Arc<R>,
    doc: DocumentId,
    bytes: Arc<[u8]>,
    tx: mpsc::Sender<RenderEvent>,
) where
    R: PageRasterizer + 'static,
{
    if let Err(e) = render_pages(rasterizer, doc, bytes, &tx).await {
        let _ = tx
            .send(RenderEvent::Failed {
                doc,
                message: format!("{:#}", e),
            })
            .await;
    }
}

async fn render_pages<R>(
    rasterizer: Arc<R>,
    doc: DocumentId,
    bytes: Arc<[u8]>,
    tx: &mpsc::Sender<RenderEvent>,
) -> Result<()>
where
    R: PageRasterizer + 'static,
{
    let total = {
        let bytes = Arc::clone(&bytes);
        tokio::task::spawn_blocking(move || PdfDocument::from_bytes(&bytes).map(|d| d.page_count()))
            .await??
    };

    if tx.send(RenderEvent::Started { doc, total }).await.is_err() {
        return Ok(());
    }

    for page in 1..=total {
        let rasterizer = Arc::clone(&rasterizer);
        let bytes = Arc::clone(&bytes);
        let image = tokio::task::spawn_blocking(move || rasterizer.render(&bytes, page)).await??;

        if tx.send(RenderEvent::Page { doc, page, image }).await.is_err() {
            debug!("render receiver for {:?} dropped at page {}", doc, page);
            return Ok(());
        }
    }

    let _ = tx.send(RenderEvent::Finished { doc, total }).await;
    Ok(())
}
