use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::pdf::{FrameRasterizer, PdfDocument};
use crate::selection::Key;
use crate::view::{render_document, DocumentView, RenderEvent, ViewEvent};

const HELP: &str = "\
Commands:
  click N          click page N (honours held keys)
  down KEY         press shift, ctrl or a
  up KEY           release shift, ctrl or a
  type TEXT        edit the range field (e.g. 1,3,5-7)
  commit           apply the edited range field
  show             print the current selection
  save PATH        write the selected pages to PATH
  help             show this help
  quit             leave";

#[derive(Debug, Clone, PartialEq)]
enum SessionCommand {
    Input(ViewEvent),
    Show,
    Save(PathBuf),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<SessionCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let key = |rest: &str| {
        Key::from_name(rest).ok_or_else(|| format!("Unknown key '{}' (use shift, ctrl or a)", rest))
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "click" => {
            let page = rest
                .parse::<u32>()
                .map_err(|_| format!("Invalid page number: '{}'", rest))?;
            SessionCommand::Input(ViewEvent::Click(page))
        }
        "down" => SessionCommand::Input(ViewEvent::KeyDown(key(rest)?)),
        "up" => SessionCommand::Input(ViewEvent::KeyUp(key(rest)?)),
        "type" => SessionCommand::Input(ViewEvent::EditText(rest.to_string())),
        "commit" => SessionCommand::Input(ViewEvent::CommitText),
        "show" => SessionCommand::Show,
        "save" if !rest.is_empty() => SessionCommand::Save(PathBuf::from(rest)),
        "save" => return Err("save needs an output path".to_string()),
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        other => return Err(format!("Unknown command '{}' (try 'help')", other)),
    };
    Ok(Some(command))
}

pub async fn run(path: &Path, thumbnails: Option<&Path>, scale: f32) -> Result<()> {
    let bytes: Arc<[u8]> = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read PDF: {}", path.display()))?
        .into();

    if let Some(dir) = thumbnails {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let mut view = DocumentView::new();
    let doc = view.load();
    let (tx, mut rx) = mpsc::channel(8);
    tokio::spawn(render_document(
        Arc::new(FrameRasterizer::new(scale)),
        doc,
        Arc::clone(&bytes),
        tx,
    ));

    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut rendering = true;

    loop {
        tokio::select! {
            event = rx.recv(), if rendering => match event {
                Some(event) => on_render(&mut view, event, thumbnails)?,
                None => rendering = false,
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(SessionCommand::Quit)) => break,
                    Ok(Some(command)) => apply(&mut view, command, &bytes)?,
                    Ok(None) => {}
                    Err(message) => println!("{}", message),
                }
            }
        }
    }

    Ok(())
}

fn on_render(view: &mut DocumentView, event: RenderEvent, thumbnails: Option<&Path>) -> Result<()> {
    let rendered_page = match &event {
        RenderEvent::Page { page, .. } => Some(*page),
        _ => None,
    };
    if !view.accept(event) {
        return Ok(());
    }

    if let (Some(page), Some(dir)) = (rendered_page, thumbnails) {
        if let Some(image) = view.page_image(page) {
            let file = dir.join(format!("page_{:04}.png", page));
            image
                .save(&file)
                .with_context(|| format!("Failed to write thumbnail: {}", file.display()))?;
        }
    }

    if let Some(total) = view.total_pages().filter(|_| rendered_page.is_none()) {
        info!("rendered {} page(s)", total);
        println!("Document ready: {} page(s).", total);
    }
    if let Some(message) = view.failure() {
        println!("Could not render document: {}", message);
    }
    Ok(())
}

fn apply(view: &mut DocumentView, command: SessionCommand, bytes: &[u8]) -> Result<()> {
    match command {
        SessionCommand::Input(event) => {
            if view.handle(event) {
                println!("Selected: {}", display_range(&view.range_text()));
            }
        }
        SessionCommand::Show => print_status(view),
        SessionCommand::Help => println!("{}", HELP),
        SessionCommand::Save(output) => save(view, bytes, &output)?,
        SessionCommand::Quit => {}
    }
    Ok(())
}

fn print_status(view: &DocumentView) {
    if let Some(doc) = view.document() {
        println!("Document: #{}", doc.raw());
    }
    let total = match (view.total_pages(), view.expected_pages()) {
        (Some(total), _) => total.to_string(),
        (None, Some(expected)) if view.is_rendering() => {
            format!("{} of {} rendered", view.known_pages(), expected)
        }
        _ => format!("{} rendered", view.known_pages()),
    };
    let mods = view.modifiers();
    println!("Pages: {}", total);
    println!("Selected pages: {}", view.selection().len());
    println!(
        "Held: shift={} ctrl={} a={}",
        mods.shift, mods.ctrl, mods.a
    );
    println!("Range field: {}", display_range(&view.range_text()));
    if let Some(anchor) = view.anchor() {
        println!("Anchor: {}", anchor);
    }
}

fn display_range(text: &str) -> &str {
    if text.is_empty() {
        "(none)"
    } else {
        text
    }
}

fn save(view: &DocumentView, bytes: &[u8], output: &Path) -> Result<()> {
    let pages = match view.submission() {
        Ok(pages) => pages,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    let source = PdfDocument::from_bytes(bytes)?;
    let total = source.page_count();
    let pages: Vec<u32> = pages.into_iter().filter(|&p| p >= 1 && p <= total).collect();
    if pages.is_empty() {
        println!("None of the selected pages exist in this document.");
        return Ok(());
    }

    let mut new_doc = source.extract_pages(&pages)?;
    PdfDocument::save(&mut new_doc, output)?;
    println!("Saved {} page(s) to {}", pages.len(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::{page_widths, sample_pdf};

    fn parse(line: &str) -> SessionCommand {
        parse_command(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("click 4"), SessionCommand::Input(ViewEvent::Click(4)));
        assert_eq!(
            parse("down Shift"),
            SessionCommand::Input(ViewEvent::KeyDown(Key::Shift))
        );
        assert_eq!(parse("up a"), SessionCommand::Input(ViewEvent::KeyUp(Key::A)));
        assert_eq!(
            parse("type 1, 3, 5-7"),
            SessionCommand::Input(ViewEvent::EditText("1, 3, 5-7".to_string()))
        );
        assert_eq!(
            parse("type"),
            SessionCommand::Input(ViewEvent::EditText(String::new()))
        );
        assert_eq!(parse("commit"), SessionCommand::Input(ViewEvent::CommitText));
        assert_eq!(parse("save out.pdf"), SessionCommand::Save(PathBuf::from("out.pdf")));
        assert_eq!(parse("QUIT"), SessionCommand::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert!(parse_command("click x").is_err());
        assert!(parse_command("down alt").is_err());
        assert!(parse_command("save").is_err());
        assert!(parse_command("jump 3").is_err());
    }

    fn ready_view(pages: u32) -> DocumentView {
        let mut view = DocumentView::new();
        let doc = view.load();
        for page in 1..=pages {
            view.accept(RenderEvent::Page {
                doc,
                page,
                image: crate::pdf::RgbaImage::new(1, 1),
            });
        }
        view.accept(RenderEvent::Finished { doc, total: pages });
        view
    }

    #[test]
    fn test_session_save() {
        let bytes = sample_pdf(5);
        let mut view = ready_view(5);
        for line in ["click 2", "down shift", "click 4", "up shift", "type 2-4,9", "commit"] {
            apply(&mut view, parse(line), &bytes).unwrap();
        }

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("picked.pdf");
        apply(&mut view, SessionCommand::Save(output.clone()), &bytes).unwrap();
        assert_eq!(
            page_widths(&std::fs::read(&output).unwrap()),
            vec![200, 300, 400]
        );
    }

    #[test]
    fn test_session_save_empty_selection_writes_nothing() {
        let bytes = sample_pdf(2);
        let mut view = ready_view(2);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("picked.pdf");
        apply(&mut view, SessionCommand::Save(output.clone()), &bytes).unwrap();
        assert!(!output.exists());
    }

    #[test]
    fn test_thumbnails_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut view = DocumentView::new();
        let doc = view.load();
        on_render(
            &mut view,
            RenderEvent::Page {
                doc,
                page: 1,
                image: crate::pdf::RgbaImage::new(4, 4),
            },
            Some(dir.path()),
        )
        .unwrap();
        assert!(dir.path().join("page_0001.png").exists());
        assert_eq!(view.known_pages(), 1);
    }
}
