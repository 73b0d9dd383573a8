//! Invoice data model and the result/report envelopes.
//!
//! Every type here serialises field-for-field, so an HTTP layer wrapping the
//! library can return these structs directly without a translation step.
//!
//! [`InvoiceRecord`] is constructed exactly once per extraction, after the
//! schema completer has filled defaults and reconciled amounts. It is not
//! mutated afterwards; the caller owns it outright.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_currency() -> String {
    "USD".to_string()
}

fn default_quantity() -> u32 {
    1
}

/// A fully normalised invoice as extracted from one image.
///
/// Free-form sections (`buyer_info`, `supplier_info`, `payment_terms`,
/// `additional_info`) stay as JSON mappings: the model reports whatever the
/// invoice shows (contact person, tax id, bank details, stamps…) and forcing
/// a fixed struct would silently drop fields the caller may care about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Invoice number/identifier; empty when not recognised.
    #[serde(default)]
    pub invoice_number: String,

    /// Issue date as canonical `YYYY-MM-DD`, or the raw string when no known
    /// format matched. Empty when not recognised.
    #[serde(default)]
    pub date: String,

    /// Buyer details (company name, contact, address, tax id…).
    #[serde(default)]
    pub buyer_info: Map<String, Value>,

    /// Supplier details (company name, address, bank info…).
    #[serde(default)]
    pub supplier_info: Map<String, Value>,

    /// Line items in invoice order. Items without a product name were
    /// discarded during cleaning.
    #[serde(default)]
    pub items: Vec<LineItem>,

    /// Sum of line amounts before tax/shipping. Zero when not recognised and
    /// not reconstructible from items.
    #[serde(default)]
    pub subtotal: f64,

    /// Total tax charged.
    #[serde(default)]
    pub tax_amount: f64,

    /// Shipping/freight cost.
    #[serde(default)]
    pub shipping_cost: f64,

    /// Discount applied (positive number, subtracted from the total).
    #[serde(default)]
    pub discount: f64,

    /// Grand total. Zero only when neither read nor reconstructible.
    #[serde(default)]
    pub total_amount: f64,

    /// ISO 4217 currency code.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Payment terms (trade terms, method, period, delivery…).
    #[serde(default)]
    pub payment_terms: Map<String, Value>,

    /// Anything else the model recognised (notes, stamps, signatures…).
    #[serde(default)]
    pub additional_info: Map<String, Value>,
}

/// One row of a purchased/sold product or service on the invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Sequential number; defaults to the 1-based position when the invoice
    /// does not print one.
    pub item_number: u32,

    /// Product or service name. Never empty in a constructed record — the
    /// cleaner drops unnamed items before this type is built.
    pub product_name: String,

    /// Specification / model / variant text; may be empty.
    #[serde(default)]
    pub specification: String,

    /// Quantity, floored at 1.
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Price per unit.
    #[serde(default)]
    pub unit_price: f64,

    /// Line amount as printed. Not recomputed from `quantity × unit_price`;
    /// the post-hoc validator reports disagreement instead.
    #[serde(default)]
    pub amount: f64,
}

/// Outcome of one extraction call.
///
/// Exactly one of (`record` + `confidence`) or `error` is populated. The
/// orchestrator never returns `Err` — every failure becomes a value of this
/// type with `success == false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Whether a record was produced.
    pub success: bool,

    /// The extracted invoice, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<InvoiceRecord>,

    /// Rubric-based extraction confidence in `[0, 1]`, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Human-readable failure message, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    /// Successful extraction.
    pub fn ok(record: InvoiceRecord, confidence: f64) -> Self {
        Self {
            success: true,
            record: Some(record),
            confidence: Some(confidence),
            error: None,
        }
    }

    /// Failed extraction with a human-readable message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            record: None,
            confidence: None,
            error: Some(message.into()),
        }
    }
}

/// Second-pass consistency report produced by [`crate::validate`].
///
/// `confidence` here is a cheap penalty heuristic
/// (`1 − 0.2·issues − 0.1·warnings`) and is deliberately independent of the
/// rubric score in [`ExtractionResult`]: the scorer estimates how much of the
/// invoice was captured, this number prices the inconsistencies found after
/// the fact. The two are not reconciled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True iff no hard issues were found.
    pub is_valid: bool,

    /// Hard problems (e.g. no items at all) in detection order.
    pub issues: Vec<String>,

    /// Soft problems (e.g. arithmetic drift) in detection order.
    pub warnings: Vec<String>,

    /// Penalty-based confidence in `[0, 1]`.
    pub confidence: f64,

    /// Number of line items in the validated record.
    pub items_count: usize,

    /// One-line human-readable summary of the counts above.
    pub validation_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_deserialises_from_sparse_json() {
        let record: InvoiceRecord = serde_json::from_str(r#"{"invoice_number":"INV-1"}"#).unwrap();
        assert_eq!(record.invoice_number, "INV-1");
        assert_eq!(record.currency, "USD");
        assert_eq!(record.subtotal, 0.0);
        assert!(record.items.is_empty());
        assert!(record.buyer_info.is_empty());
    }

    #[test]
    fn failure_result_has_no_record() {
        let r = ExtractionResult::failure("boom");
        assert!(!r.success);
        assert!(r.record.is_none());
        assert!(r.confidence.is_none());
        assert_eq!(r.error.as_deref(), Some("boom"));
    }

    #[test]
    fn result_serialisation_skips_empty_sides() {
        let json = serde_json::to_string(&ExtractionResult::failure("x")).unwrap();
        assert!(!json.contains("record"));
        let json = serde_json::to_string(&ExtractionResult::ok(InvoiceRecord::default(), 0.5)).unwrap();
        assert!(!json.contains("error"));
    }
}
