//! Post-hoc consistency validation.
//!
//! A second, cheaper pass over a completed record that reports what the
//! pipeline could not fix: hard issues (the record is structurally unusable)
//! and soft warnings (the numbers disagree with each other). It never fails,
//! even on a degenerate record — the report *is* the output.
//!
//! The report's confidence is a penalty heuristic
//! (`1 − 0.2·issues − 0.1·warnings`), intentionally separate from the
//! rubric score computed at extraction time; see
//! [`crate::record::ValidationReport::confidence`].

use crate::record::{InvoiceRecord, ValidationReport};
use tracing::debug;

/// Absolute drift above which amount arithmetic is reported.
const AMOUNT_TOLERANCE: f64 = 0.01;

/// Validate a completed record and report issues and warnings.
pub fn validate(record: &InvoiceRecord) -> ValidationReport {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    if record.items.is_empty() {
        issues.push("no line items recognised".to_string());
    }

    for (i, item) in record.items.iter().enumerate() {
        if item.product_name.is_empty() {
            issues.push(format!("item {} is missing a product name", i + 1));
        }

        let expected = item.quantity as f64 * item.unit_price;
        if (expected - item.amount).abs() > AMOUNT_TOLERANCE {
            warnings.push(format!(
                "item {} amount {:.2} differs from quantity × unit price ({:.2})",
                i + 1,
                item.amount,
                expected
            ));
        }
    }

    if !record.items.is_empty() && record.subtotal > 0.0 {
        let items_sum: f64 = record.items.iter().map(|i| i.amount).sum();
        let drift = (items_sum - record.subtotal).abs();
        if drift > AMOUNT_TOLERANCE {
            warnings.push(format!(
                "item amounts sum to {items_sum:.2} but subtotal is {:.2}",
                record.subtotal
            ));
        }
    }

    let is_valid = issues.is_empty();
    let confidence = (1.0 - (issues.len() as f64 * 0.2 + warnings.len() as f64 * 0.1)).max(0.0);
    let validation_summary = format!(
        "found {} issue(s), {} warning(s)",
        issues.len(),
        warnings.len()
    );
    debug!(
        is_valid,
        issues = issues.len(),
        warnings = warnings.len(),
        "validation complete"
    );

    ValidationReport {
        is_valid,
        issues,
        warnings,
        confidence,
        items_count: record.items.len(),
        validation_summary,
    }
}
