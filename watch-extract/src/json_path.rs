//! Path addressing into parsed JSON documents.
//!
//! Two spellings are accepted: a JSON pointer (`/items/0/price`) and a
//! dotted path (`items.0.price`). Numeric segments index arrays.

use crate::error::{ExtractError, Result};
use serde_json::Value;

/// Resolve `path` against `document`.
///
/// An empty path addresses the whole document. A path that does not resolve
/// returns `Value::Null`, because a missing key on a page that is still
/// loading is a legitimate observation, not a configuration error.
///
/// # Errors
///
/// Returns [`ExtractError::MalformedQuery`] if a dotted path contains an
/// empty segment (`a..b`, `.a`, `a.`).
pub fn resolve(document: &Value, path: &str) -> Result<Value> {
    let path = path.trim();
    if path.is_empty() {
        return Ok(document.clone());
    }
    if path.starts_with('/') {
        return Ok(document.pointer(path).cloned().unwrap_or(Value::Null));
    }

    let segments = parse_dotted(path)?;
    let mut current = document;
    for segment in segments {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Ok(Value::Null),
        }
    }
    Ok(current.clone())
}

fn parse_dotted(path: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ExtractError::MalformedQuery(format!(
            "empty segment in JSON path \"{path}\""
        )));
    }
    Ok(segments)
}
