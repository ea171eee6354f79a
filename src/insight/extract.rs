//! JSON extraction from backend replies
//!
//! Backends are asked for strict JSON but routinely wrap it in prose or
//! fenced code blocks. This module locates the first syntactically
//! well-formed array or object substring and decodes it; one bounded
//! strategy, not an exception-driven retry loop.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{PipelineError, Result};

/// Finds the end index (exclusive) of the balanced JSON value starting at
/// `start`, honoring strings and escapes. Returns `None` when unbalanced.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let open = bytes[start];
    let close = match open {
        b'[' => b']',
        b'{' => b'}',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            _ if b == open => depth += 1,
            _ if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extracts the first well-formed JSON array or object embedded in `text`.
pub fn first_json(text: &str) -> Result<Value> {
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'[' && b != b'{' {
            continue;
        }
        if let Some(end) = balanced_end(bytes, i) {
            if let Ok(value) = serde_json::from_slice::<Value>(&bytes[i..end]) {
                return Ok(value);
            }
        }
    }
    Err(PipelineError::NoJsonPayload)
}

/// Extracts and decodes the first embedded JSON value into `T`
pub fn first_json_as<T: DeserializeOwned>(text: &str) -> Result<T> {
    let value = first_json(text)?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_array() {
        let value = first_json(r#"["a", "b"]"#).unwrap();
        assert_eq!(value, serde_json::json!(["a", "b"]));
    }

    #[test]
    fn array_wrapped_in_prose() {
        let text = "Here are the themes you asked for:\n[\"slow loading\", \"crashes\"]\nHope that helps!";
        let value = first_json(text).unwrap();
        assert_eq!(value, serde_json::json!(["slow loading", "crashes"]));
    }

    #[test]
    fn fenced_code_block() {
        let text = "```json\n[{\"label\": \"payments\", \"count\": 4}]\n```";
        let parsed: Vec<serde_json::Value> = first_json_as(text).unwrap();
        assert_eq!(parsed[0]["label"], "payments");
    }

    #[test]
    fn brackets_inside_strings_do_not_confuse_balancing() {
        let text = r#"noise ["a ] tricky [ string", "b"] trailing"#;
        let value = first_json(text).unwrap();
        assert_eq!(value, serde_json::json!(["a ] tricky [ string", "b"]));
    }

    #[test]
    fn skips_malformed_prefix_and_finds_later_value() {
        // The first bracket opens an unbalanced fragment; the object after
        // it is well-formed.
        let text = r#"broken [1, 2 ... but {"ok": true} survives"#;
        let value = first_json(text).unwrap();
        assert_eq!(value, serde_json::json!({"ok": true}));
    }

    #[test]
    fn no_json_is_an_error() {
        let err = first_json("no structured data here").unwrap_err();
        assert!(matches!(err, PipelineError::NoJsonPayload));
    }

    #[test]
    fn typed_decode_failure_is_a_parse_error() {
        let result: Result<Vec<String>> = first_json_as(r#"[{"not": "a string"}]"#);
        assert!(result.is_err());
    }
}
