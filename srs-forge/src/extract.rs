//! JSON extraction from model output
//!
//! Model replies are free text that usually, but not always, contain a JSON
//! object. Extraction takes the substring from the first `{` to the last `}`
//! (preferring a fenced ```json block when one is present) and parses it.
//! Callers can distinguish "no JSON present" from "malformed JSON".

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Extract the JSON object embedded in free text, if any
///
/// Handles:
/// - ```json fenced blocks
/// - generic ``` fenced blocks
/// - raw text with surrounding prose
///
/// Returns `None` when the text contains no `{`/`}` pair.
pub fn extract_json(text: &str) -> Option<String> {
    let body = if let Some(fence_start) = text.find("```json") {
        let start = fence_start + 7;
        let end = text[start..]
            .rfind("```")
            .map(|pos| pos + start)
            .unwrap_or(text.len());
        &text[start..end]
    } else if let Some(fence_start) = text.find("```") {
        let start = fence_start + 3;
        let end = text[start..]
            .rfind("```")
            .map(|pos| pos + start)
            .unwrap_or(text.len());
        &text[start..end]
    } else {
        text
    };

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }
    Some(body[start..=end].trim().to_string())
}

/// Parse the JSON object embedded in model output into a typed structure
///
/// Returns `Ok(None)` when no JSON object is present at all, and `Err` when
/// an object was found but does not parse. Callers decide whether to degrade
/// to a default structure or abort.
pub fn parse_json_lenient<T: DeserializeOwned>(text: &str) -> Result<Option<T>> {
    let Some(json) = extract_json(text) else {
        return Ok(None);
    };
    let value = serde_json::from_str(&json)
        .with_context(|| format!("Model output is not valid JSON: {}", preview(&json)))?;
    Ok(Some(value))
}

/// First 200 chars of a string, for error context
fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}
