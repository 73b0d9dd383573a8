//! # invoice2json
//!
//! Extract structured invoice data from images using multimodal Vision
//! Language Models (VLMs).
//!
//! ## Why this crate?
//!
//! Traditional OCR gives you text with coordinates and leaves the hard part —
//! understanding which text is the invoice number, which table rows are line
//! items, which number is the subtotal — to hand-written layout heuristics
//! that break on every new template. Instead this crate hands the whole image
//! to a VLM and concentrates on what code does better than models: locating
//! the JSON in a chatty reply, defaulting missing fields, normalising dates
//! and amounts, reconciling totals, and scoring how trustworthy the result is.
//!
//! ## Pipeline Overview
//!
//! ```text
//! invoice image
//!  │
//!  ├─ 1. Preprocess  resize, sharpen/contrast/brighten, re-encode PNG
//!  ├─ 2. VLM         one generateContent call (prompt + inline image)
//!  ├─ 3. Locate      find the JSON object in the free-form reply
//!  ├─ 4. Complete    defaults, item cleaning, amount/date normalisation,
//!  │                 fill-zeros amount reconciliation
//!  ├─ 5. Construct   typed InvoiceRecord
//!  └─ 6. Score       100-point completeness/consistency rubric → [0, 1]
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use invoice2json::{extract, validate, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from GEMINI_API_KEY / GOOGLE_API_KEY
//!     let config = ExtractionConfig::default();
//!     let bytes = std::fs::read("invoice.png")?;
//!     let result = extract(&bytes, &config).await;
//!     if let (Some(record), Some(confidence)) = (&result.record, result.confidence) {
//!         println!("{} ({confidence:.2})", record.invoice_number);
//!         let report = validate(record);
//!         eprintln!("{}", report.validation_summary);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `invoice2json` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! invoice2json = { version = "0.3", default-features = false }
//! ```
//!
//! ## Failure model
//!
//! [`extract`] never returns `Err`: every failure — no API key, transport
//! error, empty reply, no parseable JSON — becomes an [`ExtractionResult`]
//! with `success == false` and a message. [`validate`] runs after the fact on
//! a record and likewise always produces a report.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod confidence;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod record;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::ExtractError;
pub use extract::{extract, extract_sync};
pub use prompts::DEFAULT_SYSTEM_PROMPT;
pub use provider::{GeminiClient, ImagePayload, VisionModel};
pub use record::{ExtractionResult, InvoiceRecord, LineItem, ValidationReport};
pub use validate::validate;
