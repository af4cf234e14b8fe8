//! .docx container reading
//!
//! A `.docx` file is a zip archive; the document body lives in
//! `word/document.xml` and embedded images under `word/media/`. Text
//! extraction joins the non-empty paragraphs, matching what the original
//! intake produced for the extraction prompt.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Extract paragraph text from a .docx file
///
/// Paragraphs are joined with newlines; blank paragraphs are skipped.
pub fn extract_text(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open SRS document: {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("{} is not a valid .docx container", path.display()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .with_context(|| format!("{} has no word/document.xml entry", path.display()))?
        .read_to_string(&mut xml)
        .context("Failed to read document body")?;

    let mut paragraphs = Vec::new();
    for chunk in xml.split("</w:p>") {
        let text = collect_runs(chunk);
        if !text.trim().is_empty() {
            paragraphs.push(text.trim().to_string());
        }
    }
    Ok(paragraphs.join("\n"))
}

/// Extract embedded image bytes (word/media entries) in archive order
pub fn extract_images(path: &Path) -> Result<Vec<Vec<u8>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open SRS document: {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("{} is not a valid .docx container", path.display()))?;

    let media_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("word/media/"))
        .map(String::from)
        .collect();

    let mut images = Vec::new();
    for name in media_names {
        let mut bytes = Vec::new();
        archive
            .by_name(&name)
            .with_context(|| format!("Failed to read embedded image {}", name))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read embedded image {}", name))?;
        images.push(bytes);
    }
    Ok(images)
}

/// Concatenate the `<w:t>` runs of one paragraph chunk
fn collect_runs(chunk: &str) -> String {
    let mut text = String::new();
    let mut rest = chunk;
    while let Some(open) = rest.find("<w:t") {
        let after_open = &rest[open..];
        // Tag may carry attributes (e.g. xml:space="preserve")
        let Some(close_bracket) = after_open.find('>') else {
            break;
        };
        let run_body = &after_open[close_bracket + 1..];
        let Some(end) = run_body.find("</w:t>") else {
            break;
        };
        text.push_str(&unescape_xml(&run_body[..end]));
        rest = &run_body[end + 6..];
    }
    text
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
