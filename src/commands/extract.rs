use crate::page_range::{decode, encode};
use crate::pdf::PdfDocument;
use anyhow::Result;
use log::warn;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, pages: &str, output: Q) -> Result<()> {
    let doc = PdfDocument::open(&input)?;
    let total_pages = doc.page_count();

    let (page_list, skipped): (Vec<u32>, Vec<u32>) = decode(pages)
        .into_iter()
        .partition(|&page| page >= 1 && page <= total_pages);

    if !skipped.is_empty() {
        warn!(
            "Skipping pages {} (document has {} pages)",
            encode(&skipped),
            total_pages
        );
    }

    if page_list.is_empty() {
        anyhow::bail!("No pages specified");
    }

    let mut new_doc = doc.extract_pages(&page_list)?;
    PdfDocument::save(&mut new_doc, &output)?;

    println!(
        "Extracted {} page(s) ({}) to {}",
        page_list.len(),
        encode(&page_list),
        output.as_ref().display()
    );

    Ok(())
}
