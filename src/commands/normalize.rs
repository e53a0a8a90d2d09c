use crate::page_range::{decode, encode};
use anyhow::Result;

pub fn run(text: &str) -> Result<()> {
    let pages = decode(text);
    if pages.is_empty() {
        println!("No pages.");
        return Ok(());
    }

    println!("{}", encode(&pages));
    Ok(())
}
