//! Helpers for pulling structured data out of free-form model replies.

use crate::error::StepError;
use serde::de::DeserializeOwned;

/// Remove a surrounding Markdown code fence and its language tag.
///
/// Text before the opening fence and after the closing fence is dropped.
/// Replies without a fence are returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let mut body = &trimmed[start + 3..];

    let tag_len = body
        .find(|c: char| c.is_whitespace())
        .unwrap_or(body.len());
    if tag_len > 0 && body[..tag_len].chars().all(|c| c.is_ascii_alphabetic()) {
        body = &body[tag_len..];
    }

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Drop a bare leading `json` or `python` line left over from a fence.
fn strip_language_line(text: &str) -> &str {
    for tag in ["json", "python"] {
        if let Some(rest) = text.strip_prefix(tag)
            && rest.starts_with(['\n', '\r'])
        {
            return rest.trim();
        }
    }
    text
}

/// Deserialize the first value opening at an `open` bracket.
///
/// Each `open` position is tried in order and anything after the value is
/// ignored, so trailing prose with its own brackets does not matter.
pub fn first_json_value<T: DeserializeOwned>(text: &str, open: char) -> Option<T> {
    text.match_indices(open).find_map(|(idx, _)| {
        serde_json::Deserializer::from_str(&text[idx..])
            .into_iter::<T>()
            .next()
            .and_then(Result::ok)
    })
}

/// Parse a reply that should hold a JSON array of strings.
///
/// Tries the cleaned reply as-is, then with single quotes swapped for double
/// quotes, then the first array found inside surrounding prose.
pub fn parse_string_list(text: &str) -> Result<Vec<String>, StepError> {
    let cleaned = strip_language_line(strip_code_fences(text));

    serde_json::from_str::<Vec<String>>(cleaned)
        .ok()
        .or_else(|| serde_json::from_str(&cleaned.replace('\'', "\"")).ok())
        .or_else(|| first_json_value(text, '['))
        .or_else(|| first_json_value(&text.replace('\'', "\""), '['))
        .ok_or_else(|| {
            StepError::parse(format!(
                "expected a JSON array of strings, got: {}",
                truncate_for_log(text)
            ))
        })
}

/// Shorten model output for error messages.
pub fn truncate_for_log(text: &str) -> String {
    const LIMIT: usize = 200;
    let trimmed = text.trim();
    match trimmed.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
