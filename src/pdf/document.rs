use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;
use std::path::Path;

use super::PdfError;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in broken files.
const MAX_TREE_DEPTH: usize = 64;

pub struct PdfDocument {
    pub doc: Document,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc =
            Document::load(path).with_context(|| format!("Failed to open PDF: {}", path.display()))?;
        Ok(PdfDocument { doc })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(bytes)?;
        Ok(PdfDocument { doc })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Dictionaries of every page, in page order, with inherited attributes
    /// resolved.
    pub fn page_dictionaries(&self) -> Result<Vec<Dictionary>, PdfError> {
        self.doc
            .get_pages()
            .into_values()
            .map(|id| flatten_page(&self.doc, id))
            .collect()
    }

    /// Build a new document holding exactly `pages`, in the given order.
    ///
    /// A page listed more than once is materialized as a separate page object
    /// each time it repeats.
    pub fn extract_pages(&self, pages: &[u32]) -> Result<Document, PdfError> {
        let all_pages = self.doc.get_pages();
        let page_count = all_pages.len() as u32;

        for &page in pages {
            if !all_pages.contains_key(&page) {
                return Err(PdfError::PageOutOfRange { page, page_count });
            }
        }

        let mut new_doc = self.doc.clone();
        let root_id = new_doc.catalog()?.get(b"Pages")?.as_reference()?;

        let mut kids = Vec::with_capacity(pages.len());
        let mut placed = HashSet::new();

        for page in pages {
            let source_id = all_pages[page];
            let mut dict = flatten_page(&self.doc, source_id)?;
            dict.set("Parent", Object::Reference(root_id));

            let target_id = if placed.insert(source_id) {
                new_doc.objects.insert(source_id, Object::Dictionary(dict));
                source_id
            } else {
                new_doc.add_object(dict)
            };
            kids.push(Object::Reference(target_id));
        }

        let root = new_doc.get_dictionary_mut(root_id)?;
        root.set("Count", kids.len() as i64);
        root.set("Kids", kids);

        new_doc.prune_objects();
        Ok(new_doc)
    }

    pub fn to_bytes(doc: &mut Document) -> Result<Vec<u8>, PdfError> {
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Save to a file
    pub fn save<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<()> {
        doc.save(&path)
            .with_context(|| format!("Failed to save PDF: {}", path.as_ref().display()))?;
        Ok(())
    }
}

fn flatten_page(doc: &Document, id: ObjectId) -> Result<Dictionary, PdfError> {
    let mut dict = doc.get_dictionary(id)?.clone();
    let mut parent = dict.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(parent_id) = parent {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return Err(PdfError::PageTree(format!(
                "page {:?} is nested deeper than {} levels",
                id, MAX_TREE_DEPTH
            )));
        }

        let node = doc.get_dictionary(parent_id)?;
        for key in INHERITABLE {
            if !dict.has(key) {
                if let Ok(value) = node.get(key) {
                    dict.set(key, value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(dict)
}
