//! Error types for the invoice2json library.
//!
//! [`ExtractError`] covers every way an extraction can go wrong, but callers
//! of the top-level [`crate::extract`] function never see it: the
//! orchestrator downgrades any escaped error into a failed
//! [`crate::record::ExtractionResult`] carrying the display message. The enum
//! exists so internal stages can use `?` and so tests can assert on the
//! specific failure kind rather than on message substrings.
//!
//! Amount and date normalisation failures are not errors at all — they are
//! absorbed locally (yielding `0.0` or the verbatim input) and never reach
//! this type.

use thiserror::Error;

/// All errors produced by the extraction pipeline.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// No model client could be constructed (missing credentials etc.).
    #[error("vision model client is not configured: {hint}")]
    ClientUnavailable { hint: String },

    /// The model API call itself failed (HTTP error, malformed envelope).
    #[error("vision model API error: {message}")]
    Api { message: String },

    /// The model returned a response with no text content.
    #[error("vision model returned an empty response")]
    EmptyResponse,

    // ── Response-handling errors ──────────────────────────────────────────
    /// No parseable JSON object could be located in the model response.
    #[error("no valid JSON found in model response")]
    JsonExtraction,

    /// The located candidate text failed to parse as JSON.
    #[error("failed to decode model JSON: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// The completed mapping did not satisfy the invoice record shape.
    ///
    /// The schema completer guarantees every top-level field, so hitting this
    /// means a bug in the completer rather than bad model output.
    #[error("completed data does not match the invoice schema: {detail}")]
    SchemaConstruction { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_unavailable_display() {
        let e = ExtractError::ClientUnavailable {
            hint: "set GEMINI_API_KEY".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("not configured"), "got: {msg}");
        assert!(msg.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn json_decode_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let e = ExtractError::from(serde_err);
        assert!(matches!(e, ExtractError::JsonDecode(_)));
        assert!(e.to_string().starts_with("failed to decode"));
    }

    #[test]
    fn empty_response_display() {
        assert_eq!(
            ExtractError::EmptyResponse.to_string(),
            "vision model returned an empty response"
        );
    }
}
