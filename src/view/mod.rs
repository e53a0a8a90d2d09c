//! The page picker for one loaded document at a time.
//!
//! [`DocumentView`] owns the selection, the modifier keys, the draft range
//! text and the rendered pages. Input events and render results both go
//! through it, and render results are matched against the current
//! [`DocumentId`] before they are applied.

pub mod render;

use log::{debug, warn};
use std::collections::BTreeSet;

use crate::pdf::RgbaImage;
use crate::selection::{Key, Modifiers, SelectionModel};
pub use render::{render_document, RenderEvent};

/// Identifies one document load within a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// User input as seen by the page picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    KeyDown(Key),
    KeyUp(Key),
    Click(u32),
    /// The range text field changed; held as a draft until committed.
    EditText(String),
    CommitText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Please select pages to split.")]
pub struct EmptySelection;

#[derive(Default)]
pub struct DocumentView {
    last_id: u64,
    current: Option<DocumentId>,
    selection: SelectionModel,
    modifiers: Modifiers,
    draft: Option<String>,
    pages: Vec<RgbaImage>,
    expected_pages: Option<u32>,
    total_pages: Option<u32>,
    failure: Option<String>,
}

impl DocumentView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start showing a new document. Everything tied to the previous one is
    /// discarded, and its in-flight render results will be rejected.
    pub fn load(&mut self) -> DocumentId {
        self.last_id += 1;
        let id = DocumentId(self.last_id);

        self.current = Some(id);
        self.selection.clear();
        self.draft = None;
        self.pages.clear();
        self.expected_pages = None;
        self.total_pages = None;
        self.failure = None;

        debug!("loaded document {:?}", id);
        id
    }

    pub fn document(&self) -> Option<DocumentId> {
        self.current
    }

    /// Apply one input event. Returns whether the selection changed.
    pub fn handle(&mut self, event: ViewEvent) -> bool {
        match event {
            ViewEvent::KeyDown(key) => {
                self.modifiers.key_down(key);
                if matches!(key, Key::Ctrl | Key::A) && self.modifiers.select_all_chord() {
                    return self.select_all();
                }
                false
            }
            ViewEvent::KeyUp(key) => {
                self.modifiers.key_up(key);
                false
            }
            ViewEvent::Click(page) => {
                let known = self.known_pages();
                if page == 0 || page > known {
                    debug!("ignoring click on page {} ({} rendered)", page, known);
                    return false;
                }
                if self.modifiers.select_all_chord() {
                    return self.select_all();
                }
                match self.total_pages {
                    Some(_) => self.selection.toggle_page(page, self.modifiers),
                    None => self.selection.toggle_page_within(page, self.modifiers, known),
                };
                true
            }
            ViewEvent::EditText(text) => {
                self.draft = Some(text);
                false
            }
            ViewEvent::CommitText => match self.draft.take() {
                Some(text) => {
                    self.selection.set_from_text(&text);
                    true
                }
                None => false,
            },
        }
    }

    /// Select every page known to exist. While rendering is still running
    /// that is only the pages rendered so far; shift ranges in `handle` are
    /// bounded the same way.
    fn select_all(&mut self) -> bool {
        if self.current.is_none() {
            return false;
        }
        let total = self.total_pages.unwrap_or_else(|| self.known_pages());
        self.selection.select_all(total);
        true
    }

    /// Apply a render result. Results for any document other than the
    /// current one are dropped and `false` is returned.
    pub fn accept(&mut self, event: RenderEvent) -> bool {
        let doc = event.document();
        if self.current != Some(doc) {
            debug!("dropping render result for stale document {:?}", doc);
            return false;
        }

        match event {
            RenderEvent::Started { total, .. } => {
                self.expected_pages = Some(total);
            }
            RenderEvent::Page { page, image, .. } => {
                let next = self.known_pages() + 1;
                if page != next {
                    warn!("expected page {} from renderer, got {}", next, page);
                    return false;
                }
                self.pages.push(image);
            }
            RenderEvent::Finished { total, .. } => {
                self.total_pages = Some(total);
            }
            RenderEvent::Failed { message, .. } => {
                warn!("rendering {:?} failed: {}", doc, message);
                self.failure = Some(message);
            }
        }
        true
    }

    /// Text for the range field: the draft while the user is typing,
    /// otherwise the encoded selection.
    pub fn range_text(&self) -> String {
        match &self.draft {
            Some(draft) => draft.clone(),
            None => self.selection.current_range_text(),
        }
    }

    pub fn selection(&self) -> &BTreeSet<u32> {
        self.selection.selected()
    }

    pub fn anchor(&self) -> Option<u32> {
        self.selection.anchor()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn known_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Page count, once the last page has rendered.
    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn is_rendering(&self) -> bool {
        self.current.is_some() && self.total_pages.is_none() && self.failure.is_none()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn expected_pages(&self) -> Option<u32> {
        self.expected_pages
    }

    /// Rendered image for 1-based `page`.
    pub fn page_image(&self, page: u32) -> Option<&RgbaImage> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
    }

    /// Pages to send for extraction, ascending.
    pub fn submission(&self) -> Result<Vec<u32>, EmptySelection> {
        if self.selection.is_empty() {
            return Err(EmptySelection);
        }
        Ok(self.selection.pages())
    }
}
