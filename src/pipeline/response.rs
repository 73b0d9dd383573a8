//! Locate the JSON object inside the model's free-form text reply.
//!
//! The prompt demands bare JSON, but models disobey in predictable ways:
//! they wrap the object in ```` ```json ```` fences, prepend "Here is the
//! extracted data:", or append a closing remark. The extraction here is
//! lenient-but-verified — it tolerates prose and markdown around a single
//! JSON object but never returns text that does not parse.
//!
//! ## Search order
//!
//! 1. A fenced block tagged `json` — take its interior
//! 2. Any fenced block — take its interior
//! 3. Otherwise the full response text
//!
//! Within the chosen text, the candidate is the slice from the first `{` to
//! the last `}` inclusive; it is returned only if `serde_json` accepts it.

use crate::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)```").unwrap());

static RE_ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[a-zA-Z0-9_-]*\s*(.*?)```").unwrap());

/// Extract the verified JSON object from a raw model response.
///
/// Returns [`ExtractError::JsonExtraction`] when no braces are found or when
/// the brace-delimited candidate fails to parse.
pub fn extract_json(response: &str) -> Result<String, ExtractError> {
    let text = response.trim();

    let text = if let Some(caps) = RE_JSON_FENCE.captures(text) {
        caps.get(1).map(|m| m.as_str()).unwrap_or(text)
    } else if let Some(caps) = RE_ANY_FENCE.captures(text) {
        caps.get(1).map(|m| m.as_str()).unwrap_or(text)
    } else {
        text
    };

    let start = text.find('{');
    let end = text.rfind('}');

    let (start, end) = match (start, end) {
        (Some(s), Some(e)) if e > s => (s, e),
        _ => return Err(ExtractError::JsonExtraction),
    };

    let candidate = &text[start..=end];
    if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
        Ok(candidate.to_string())
    } else {
        Err(ExtractError::JsonExtraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_passes_through() {
        assert_eq!(extract_json(r#"{"a":1}"#).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn json_tagged_fence_interior_is_taken() {
        let response = "Here you go:\n```json\n{\"a\":1}\n```\nDone.";
        assert_eq!(extract_json(response).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn untagged_fence_interior_is_taken() {
        let response = "```\n{\"a\": [1, 2]}\n```";
        assert_eq!(extract_json(response).unwrap(), r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn surrounding_prose_is_stripped() {
        let response = "The invoice contains: {\"invoice_number\": \"X\"} as requested.";
        assert_eq!(
            extract_json(response).unwrap(),
            r#"{"invoice_number": "X"}"#
        );
    }

    #[test]
    fn nested_braces_use_outermost_pair() {
        let response = r#"{"outer": {"inner": 1}}"#;
        assert_eq!(extract_json(response).unwrap(), response);
    }

    #[test]
    fn no_braces_fails() {
        let err = extract_json("no json here at all").unwrap_err();
        assert!(matches!(err, ExtractError::JsonExtraction));
    }

    #[test]
    fn invalid_interior_fails() {
        let err = extract_json("{this is not json}").unwrap_err();
        assert!(matches!(err, ExtractError::JsonExtraction));
    }

    #[test]
    fn reversed_braces_fail() {
        let err = extract_json("} nothing {").unwrap_err();
        assert!(matches!(err, ExtractError::JsonExtraction));
    }

    #[test]
    fn empty_response_fails() {
        assert!(extract_json("   ").is_err());
    }
}
