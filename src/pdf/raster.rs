use image::{ImageBuffer, Rgba};
use std::sync::{Mutex, PoisonError};

use super::{PdfDocument, PdfError};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Longest side of a rendered frame, in pixels. Larger pages are scaled down
/// to fit, keeping their aspect ratio.
pub const MAX_FRAME_SIDE: u32 = 4096;

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BORDER: Rgba<u8> = Rgba([220, 220, 220, 255]);

/// Turns one page of a document into a displayable image.
pub trait PageRasterizer: Send + Sync {
    /// Render 1-based `page` of the document held in `doc`.
    fn render(&self, doc: &[u8], page: u32) -> Result<RgbaImage, PdfError>;
}

/// Renders each page as a blank sheet sized from its MediaBox.
///
/// Good enough for thumbnails in a page picker, where the frame and page
/// number carry the information; it draws no page content.
///
/// Page sizes are parsed once per document and reused while successive
/// calls pass the same bytes.
pub struct FrameRasterizer {
    pub scale: f32,
    sizes: Mutex<Option<PageSizes>>,
}

struct PageSizes {
    bytes: Vec<u8>,
    sizes: Vec<(f32, f32)>,
}

impl PageSizes {
    fn parse(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = PdfDocument::from_bytes(bytes)?;
        let sizes = doc
            .page_dictionaries()?
            .iter()
            .map(media_box_size)
            .collect();
        Ok(PageSizes {
            bytes: bytes.to_vec(),
            sizes,
        })
    }
}

impl Default for FrameRasterizer {
    fn default() -> Self {
        Self::new(0.25)
    }
}

impl FrameRasterizer {
    pub fn new(scale: f32) -> Self {
        Self {
            scale,
            sizes: Mutex::new(None),
        }
    }

    fn page_size(&self, doc: &[u8], page: u32) -> Result<(f32, f32), PdfError> {
        let mut cache = self.sizes.lock().unwrap_or_else(PoisonError::into_inner);
        if !cache.as_ref().is_some_and(|cached| cached.bytes == doc) {
            *cache = Some(PageSizes::parse(doc)?);
        }

        let sizes = cache.as_ref().map(|c| c.sizes.as_slice()).unwrap_or_default();
        page.checked_sub(1)
            .and_then(|index| sizes.get(index as usize))
            .copied()
            .ok_or(PdfError::PageOutOfRange {
                page,
                page_count: sizes.len() as u32,
            })
    }
}

impl PageRasterizer for FrameRasterizer {
    fn render(&self, doc: &[u8], page: u32) -> Result<RgbaImage, PdfError> {
        let (width_pt, height_pt) = self.page_size(doc, page)?;
        let scale = if self.scale <= 0.0 { 1.0 } else { self.scale };
        let (width, height) = frame_size(width_pt * scale, height_pt * scale);

        let mut image = RgbaImage::from_pixel(width, height, PAPER);
        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, BORDER);
                image.put_pixel(x, height - 1, BORDER);
            }
            for y in 0..height {
                image.put_pixel(0, y, BORDER);
                image.put_pixel(width - 1, y, BORDER);
            }
        }

        Ok(image)
    }
}

/// Pixel size for a frame of `width` x `height`, shrunk so neither side
/// exceeds [`MAX_FRAME_SIDE`]. Each side is at least one pixel.
fn frame_size(width: f32, height: f32) -> (u32, u32) {
    let max = MAX_FRAME_SIDE as f32;
    let longest = width.max(height);
    let fit = if longest > max { max / longest } else { 1.0 };

    let pixels = |side: f32| {
        let side = (side * fit).round();
        if side.is_finite() {
            side.clamp(1.0, max) as u32
        } else {
            1
        }
    };
    (pixels(width), pixels(height))
}

fn media_box_size(dict: &lopdf::Dictionary) -> (f32, f32) {
    dict.get(b"MediaBox")
        .ok()
        .and_then(|obj| obj.as_array().ok())
        .and_then(|array| {
            if array.len() != 4 {
                return None;
            }
            let x0 = array[0].as_float().ok()?;
            let y0 = array[1].as_float().ok()?;
            let x1 = array[2].as_float().ok()?;
            let y1 = array[3].as_float().ok()?;
            Some(((x1 - x0).abs(), (y1 - y0).abs()))
        })
        .unwrap_or(DEFAULT_PAGE_SIZE)
}
