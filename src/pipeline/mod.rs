//! Pipeline stages for invoice extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different enhancement strategy) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! preprocess ──▶ model ──▶ response ──▶ normalize/schema ──▶ record
//! (image crate)  (VLM)     (locate JSON)  (clean + reconcile)
//! ```
//!
//! 1. [`preprocess`] — re-encode the caller's image for the multimodal API:
//!    RGB, capped dimensions, optional sharpening/contrast/brightness
//! 2. [`response`]   — locate and verify the JSON object inside the model's
//!    free-form text reply
//! 3. [`normalize`]  — parse heterogeneous amount and date strings into
//!    canonical numeric / ISO forms (never fails, absorbs garbage)
//! 4. [`schema`]     — fill defaults, clean line items, reconcile totals,
//!    and force the mapping into the invoice schema shape

pub mod normalize;
pub mod preprocess;
pub mod response;
pub mod schema;
