//! Rubric-based extraction confidence.
//!
//! The score is a deterministic function of the record's completeness and
//! internal arithmetic agreement — a heuristic trust estimate, not a
//! probability, and never influenced by model metadata or randomness.
//!
//! ## The 100-point rubric
//!
//! | Bucket            | Points | Signal                                         |
//! |-------------------|--------|------------------------------------------------|
//! | Basic info        | 25     | invoice number (15), date (10)                 |
//! | Party info        | 20     | supplier name (15), buyer name (5)             |
//! | Items             | 35     | any item (15) + 20 × complete-item fraction    |
//! | Amount agreement  | 20     | Σ qty×price vs subtotal (≤15), total > 0 (5)   |
//!
//! The supplier outweighs the buyer because an invoice without a readable
//! issuer is near-useless downstream, while buyer details are often absent
//! from retail invoices altogether.

use crate::record::InvoiceRecord;
use serde_json::{Map, Value};

/// Relative-error bands for the subtotal agreement points.
const SUBTOTAL_BANDS: [(f64, f64); 3] = [(0.01, 15.0), (0.05, 10.0), (0.10, 5.0)];

/// Score a constructed record against the rubric, returning a value in
/// `[0, 1]`.
///
/// `_raw` is the completed extraction mapping the record was built from; the
/// current rubric reads nothing from it, but it stays in the signature so
/// future raw-output signals (e.g. how many fields the model nulled) can be
/// weighed without an API break.
pub fn score(record: &InvoiceRecord, _raw: &Map<String, Value>) -> f64 {
    let mut points = 0.0_f64;

    // Basic info (25).
    if !record.invoice_number.is_empty() {
        points += 15.0;
    }
    if !record.date.is_empty() {
        points += 10.0;
    }

    // Party info (20).
    if has_company_name(&record.supplier_info) {
        points += 15.0;
    }
    if has_company_name(&record.buyer_info) {
        points += 5.0;
    }

    // Items (35).
    if !record.items.is_empty() {
        points += 15.0;

        let complete = record
            .items
            .iter()
            .filter(|i| !i.product_name.is_empty() && i.quantity > 0 && i.amount > 0.0)
            .count();
        points += 20.0 * (complete as f64 / record.items.len() as f64);
    }

    // Amount agreement (20) — only meaningful when items exist.
    if !record.items.is_empty() {
        let calculated: f64 = record
            .items
            .iter()
            .map(|i| i.quantity as f64 * i.unit_price)
            .sum();

        if record.subtotal > 0.0 {
            let relative_error = (calculated - record.subtotal).abs() / record.subtotal;
            for (band, award) in SUBTOTAL_BANDS {
                if relative_error < band {
                    points += award;
                    break;
                }
            }
        }

        if record.total_amount > 0.0 {
            points += 5.0;
        }
    }

    (points / 100.0).clamp(0.0, 1.0)
}

fn has_company_name(info: &Map<String, Value>) -> bool {
    info.get("company_name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.trim().is_empty())
}
