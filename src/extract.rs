//! Extraction entry points and pipeline orchestration.
//!
//! [`extract`] is the primary API: image bytes in, [`ExtractionResult`] out.
//! It never returns `Err` — any stage failure is folded into a result with
//! `success == false` and a human-readable message, so a caller wrapping the
//! library in an HTTP handler can serialise the result as-is regardless of
//! outcome.

use crate::config::ExtractionConfig;
use crate::confidence;
use crate::error::ExtractError;
use crate::pipeline::{preprocess, response, schema};
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use crate::provider::resolve_model;
use crate::record::{ExtractionResult, InvoiceRecord};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract a structured invoice record from an image.
///
/// # Arguments
/// * `image_bytes` — Raw image file bytes (PNG, JPEG, WebP…)
/// * `config` — Extraction configuration
///
/// # Returns
/// Always `Ok`-shaped: an [`ExtractionResult`] with either a record and a
/// confidence score, or `success == false` and an error message. There are no
/// retries — a flaky model call fails the extraction, and retry policy is the
/// caller's decision.
pub async fn extract(image_bytes: &[u8], config: &ExtractionConfig) -> ExtractionResult {
    match run_pipeline(image_bytes, config).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "extraction failed");
            ExtractionResult::failure(e.to_string())
        }
    }
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally. Do not call from inside an
/// async context.
pub fn extract_sync(image_bytes: &[u8], config: &ExtractionConfig) -> ExtractionResult {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(extract(image_bytes, config)),
        Err(e) => ExtractionResult::failure(format!("failed to create tokio runtime: {e}")),
    }
}

async fn run_pipeline(
    image_bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    let total_start = Instant::now();
    info!(bytes = image_bytes.len(), model = %config.model, "starting extraction");

    // ── Step 1: Resolve the model client ─────────────────────────────────
    let model = resolve_model(config)?;

    // ── Step 2: Preprocess the image ─────────────────────────────────────
    let image = preprocess::preprocess_image(image_bytes, config);
    debug!(
        bytes = image.data.len(),
        mime = %image.mime_type,
        "image preprocessed"
    );

    // ── Step 3: One model call ───────────────────────────────────────────
    let prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let llm_start = Instant::now();
    let raw_response = model.generate(prompt, &image).await?;
    debug!(
        chars = raw_response.len(),
        elapsed_ms = llm_start.elapsed().as_millis() as u64,
        "model call finished"
    );
    if raw_response.trim().is_empty() {
        return Err(ExtractError::EmptyResponse);
    }

    // ── Step 4: Locate and parse the JSON object ─────────────────────────
    let json_text = response::extract_json(&raw_response)?;
    let value: Value = serde_json::from_str(&json_text)?;
    let mut mapping = match value {
        Value::Object(map) => map,
        _ => return Err(ExtractError::JsonExtraction),
    };

    // ── Step 5: Complete the schema ──────────────────────────────────────
    schema::complete_schema(&mut mapping);

    // ── Step 6: Build the record ─────────────────────────────────────────
    let record: InvoiceRecord = serde_json::from_value(Value::Object(mapping.clone()))
        .map_err(|e| ExtractError::SchemaConstruction {
            detail: e.to_string(),
        })?;

    // ── Step 7: Score it ─────────────────────────────────────────────────
    let confidence = confidence::score(&record, &mapping);

    info!(
        invoice_number = %record.invoice_number,
        items = record.items.len(),
        confidence,
        elapsed_ms = total_start.elapsed().as_millis() as u64,
        "extraction complete"
    );
    Ok(ExtractionResult::ok(record, confidence))
}
