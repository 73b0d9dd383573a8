//! Schema completion: force the model's parsed JSON into the invoice shape.
//!
//! The model output is best-effort JSON with missing keys, stringly-typed
//! numbers, junk items, and totals that were misread or never printed. This
//! stage runs a fixed sequence of repairs over the mapping, in place:
//!
//! 1. Fill every missing or null top-level key with its type-appropriate
//!    default (the prompt tells the model to use `null` for absent
//!    information, so explicit nulls are as routine as missing keys)
//! 2. Clean each line item; drop items without a product name
//! 3. Normalise the five amount fields
//! 4. Reconcile aggregates — fill zero subtotal from the item sum, fill zero
//!    total from `subtotal + tax + shipping − discount`
//! 5. Normalise the date
//! 6. Coerce the free-form info sections to mappings
//!
//! ## Ordering matters
//! Amount normalisation must precede the arithmetic fill (otherwise
//! `"1,000"`-style strings read as zero and get clobbered), and
//! reconciliation only ever fills zeros — a non-zero stored value is the
//! invoice's own statement and is never overwritten, even when the items
//! disagree with it. Disagreement is the post-hoc validator's business.
//!
//! Running the completer on its own output is a no-op.

use crate::pipeline::normalize::{normalize_amount, normalize_date};
use serde_json::{json, Map, Value};
use tracing::debug;

const AMOUNT_FIELDS: [&str; 5] = [
    "subtotal",
    "tax_amount",
    "shipping_cost",
    "discount",
    "total_amount",
];

const INFO_FIELDS: [&str; 4] = [
    "buyer_info",
    "supplier_info",
    "payment_terms",
    "additional_info",
];

fn default_for(key: &str) -> Value {
    match key {
        "invoice_number" | "date" => json!(""),
        "items" => json!([]),
        "currency" => json!("USD"),
        k if AMOUNT_FIELDS.contains(&k) => json!(0.0),
        _ => json!({}),
    }
}

/// Complete and validate the raw extraction mapping, in place.
///
/// Never fails: every malformed shape short of the top-level value not being
/// a mapping (the caller's guard) is repaired or replaced with a default, and
/// the output always deserialises into [`crate::record::InvoiceRecord`].
pub fn complete_schema(data: &mut Map<String, Value>) {
    // 1. Defaults for missing and null keys.
    for key in [
        "invoice_number",
        "date",
        "buyer_info",
        "supplier_info",
        "items",
        "subtotal",
        "tax_amount",
        "shipping_cost",
        "discount",
        "total_amount",
        "currency",
        "payment_terms",
        "additional_info",
    ] {
        if !matches!(data.get(key), Some(v) if !v.is_null()) {
            data.insert(key.to_string(), default_for(key));
        }
    }

    // The two free-text scalars get the same stringify-and-trim treatment as
    // item text fields; a non-scalar value falls back to the default.
    let invoice_number = trimmed_string(data.get("invoice_number"));
    data.insert("invoice_number".to_string(), json!(invoice_number));
    if !matches!(data.get("currency"), Some(Value::String(_))) {
        data.insert("currency".to_string(), default_for("currency"));
    }

    // 2. Clean line items, dropping entries without a product name.
    let cleaned_items: Vec<Value> = match data.get("items") {
        Some(Value::Array(raw_items)) => raw_items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match item {
                Value::Object(m) => {
                    let cleaned = clean_item(m, i as u32 + 1);
                    let named = cleaned
                        .get("product_name")
                        .and_then(Value::as_str)
                        .is_some_and(|n| !n.is_empty());
                    named.then(|| Value::Object(cleaned))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    debug!(items = cleaned_items.len(), "line items cleaned");
    data.insert("items".to_string(), Value::Array(cleaned_items));

    // 3. Normalise the amount fields independently; idempotent for values
    //    that are already numeric.
    for field in AMOUNT_FIELDS {
        let amount = normalize_amount(data.get(field).unwrap_or(&Value::Null));
        data.insert(field.to_string(), json!(amount));
    }

    // 4. Reconcile aggregates: fill zeros, never overwrite.
    reconcile_amounts(data);

    // 5. Canonical date.
    let date = normalize_date(data.get("date").unwrap_or(&Value::Null));
    data.insert("date".to_string(), Value::String(date));

    // 6. The info sections must be mappings whatever the model produced.
    for field in INFO_FIELDS {
        if !matches!(data.get(field), Some(Value::Object(_))) {
            data.insert(field.to_string(), json!({}));
        }
    }
}

/// Clean one raw line item. `position` is the 1-based index used when the
/// invoice does not print its own item number.
///
/// An empty `product_name` in the output is the discard signal; filtering
/// happens in [`complete_schema`], not here.
fn clean_item(item: &Map<String, Value>, position: u32) -> Map<String, Value> {
    let item_number = item
        .get("item_number")
        .and_then(Value::as_u64)
        .filter(|&n| n > 0 && n <= u32::MAX as u64)
        .unwrap_or(position as u64);

    let mut cleaned = Map::new();
    cleaned.insert("item_number".into(), json!(item_number));
    cleaned.insert(
        "product_name".into(),
        json!(trimmed_string(item.get("product_name"))),
    );
    cleaned.insert(
        "specification".into(),
        json!(trimmed_string(item.get("specification"))),
    );
    cleaned.insert("quantity".into(), json!(to_quantity(item.get("quantity"))));
    cleaned.insert(
        "unit_price".into(),
        json!(normalize_amount(item.get("unit_price").unwrap_or(&Value::Null))),
    );
    cleaned.insert(
        "amount".into(),
        json!(normalize_amount(item.get("amount").unwrap_or(&Value::Null))),
    );
    cleaned
}

/// Fill a zero subtotal from the item sum, then a zero total from the
/// aggregate formula. Non-zero stored values always win.
fn reconcile_amounts(data: &mut Map<String, Value>) {
    let items_sum: f64 = data
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.get("amount").and_then(Value::as_f64))
                .sum()
        })
        .unwrap_or(0.0);

    if amount_field(data, "subtotal") == 0.0 && items_sum > 0.0 {
        debug!(subtotal = items_sum, "filled subtotal from item sum");
        data.insert("subtotal".to_string(), json!(items_sum));
    }

    if amount_field(data, "total_amount") == 0.0 {
        let candidate = amount_field(data, "subtotal") + amount_field(data, "tax_amount")
            + amount_field(data, "shipping_cost")
            - amount_field(data, "discount");
        if candidate > 0.0 {
            debug!(total = candidate, "filled total from aggregate formula");
            data.insert("total_amount".to_string(), json!(candidate));
        }
    }
}

fn amount_field(data: &Map<String, Value>, field: &str) -> f64 {
    data.get(field).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Stringify-and-trim for text fields; non-text values become empty strings
/// rather than `"null"`/`"true"` artefacts.
fn trimmed_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Safe quantity conversion: floor to an integer, minimum 1.
fn to_quantity(value: Option<&Value>) -> u32 {
    let quantity = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(1.0),
        Some(Value::String(s)) => {
            let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
            cleaned.parse::<f64>().unwrap_or(1.0)
        }
        _ => 1.0,
    };
    if quantity.is_finite() && quantity >= 1.0 {
        (quantity.floor() as u64).min(u32::MAX as u64) as u32
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(raw: Value) -> Map<String, Value> {
        let Value::Object(mut map) = raw else {
            panic!("test input must be an object")
        };
        complete_schema(&mut map);
        map
    }

    #[test]
    fn empty_input_gets_full_default_shape() {
        let data = complete(json!({}));
        assert_eq!(data["invoice_number"], json!(""));
        assert_eq!(data["currency"], json!("USD"));
        assert_eq!(data["items"], json!([]));
        assert_eq!(data["subtotal"], json!(0.0));
        assert_eq!(data["buyer_info"], json!({}));
        assert_eq!(data.len(), 13);
    }

    #[test]
    fn null_values_are_defaulted_like_missing_keys() {
        // The prompt invites nulls for absent information; they must not
        // survive into the completed mapping.
        let data = complete(json!({
            "invoice_number": null,
            "date": null,
            "items": null,
            "subtotal": null,
            "currency": null,
            "buyer_info": null
        }));
        assert_eq!(data["invoice_number"], json!(""));
        assert_eq!(data["date"], json!(""));
        assert_eq!(data["items"], json!([]));
        assert_eq!(data["subtotal"], json!(0.0));
        assert_eq!(data["currency"], json!("USD"));
        assert_eq!(data["buyer_info"], json!({}));
    }

    #[test]
    fn scalar_invoice_number_is_stringified() {
        let data = complete(json!({"invoice_number": 20240115}));
        assert_eq!(data["invoice_number"], json!("20240115"));
        // Non-scalar junk falls back to the default.
        let data = complete(json!({"invoice_number": ["INV-1"], "currency": 840}));
        assert_eq!(data["invoice_number"], json!(""));
        assert_eq!(data["currency"], json!("USD"));
    }

    #[test]
    fn unnamed_items_are_dropped_and_positions_fill_numbers() {
        let data = complete(json!({
            "items": [
                {"product_name": "  Widget  ", "quantity": "2", "unit_price": "5"},
                {"product_name": "", "quantity": 1},
                {"specification": "no name at all"},
                "not even an object",
                {"product_name": "Gadget", "item_number": 7}
            ]
        }));
        let items = data["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["product_name"], json!("Widget"));
        assert_eq!(items[0]["item_number"], json!(1));
        assert_eq!(items[0]["quantity"], json!(2));
        assert_eq!(items[0]["unit_price"], json!(5.0));
        // Explicit item numbers survive cleaning.
        assert_eq!(items[1]["item_number"], json!(7));
    }

    #[test]
    fn subtotal_and_total_fill_from_items_only_when_zero() {
        let data = complete(json!({
            "items": [{"product_name": "Widget", "quantity": 2, "unit_price": 5, "amount": 10}],
            "subtotal": 0,
            "total_amount": 0
        }));
        assert_eq!(data["subtotal"], json!(10.0));
        assert_eq!(data["total_amount"], json!(10.0));
    }

    #[test]
    fn item_amount_is_not_autofilled_from_quantity_times_price() {
        // Only subtotal/total reconciliation fills zeros; the per-item
        // amount stays whatever was read (here: absent → 0.0).
        let data = complete(json!({
            "items": [{"product_name": "Widget", "quantity": "2", "unit_price": "5"}],
            "subtotal": 0,
            "total_amount": 0
        }));
        let items = data["items"].as_array().unwrap();
        assert_eq!(items[0]["amount"], json!(0.0));
        // With the item amount at zero, there is no item sum to fill from.
        assert_eq!(data["subtotal"], json!(0.0));
        assert_eq!(data["total_amount"], json!(0.0));
    }

    #[test]
    fn nonzero_stored_values_are_never_overwritten() {
        let data = complete(json!({
            "items": [{"product_name": "Widget", "amount": 10}],
            "subtotal": 999.0,
            "total_amount": 1.0
        }));
        assert_eq!(data["subtotal"], json!(999.0));
        assert_eq!(data["total_amount"], json!(1.0));
    }

    #[test]
    fn total_fills_from_aggregate_formula() {
        let data = complete(json!({
            "subtotal": 100, "tax_amount": 13, "shipping_cost": 7,
            "discount": 20, "total_amount": 0
        }));
        assert_eq!(data["total_amount"], json!(100.0));
    }

    #[test]
    fn negative_aggregate_candidate_leaves_total_at_zero() {
        let data = complete(json!({
            "subtotal": 10, "discount": 50, "total_amount": 0
        }));
        assert_eq!(data["total_amount"], json!(0.0));
    }

    #[test]
    fn stringly_amounts_are_normalised() {
        let data = complete(json!({
            "subtotal": "$1,000", "tax_amount": "130,50", "total_amount": "bogus"
        }));
        assert_eq!(data["subtotal"], json!(1000.0));
        assert_eq!(data["tax_amount"], json!(130.5));
        // "bogus" → 0.0 → refilled from the aggregate formula.
        assert_eq!(data["total_amount"], json!(1130.5));
    }

    #[test]
    fn date_is_normalised_in_place() {
        let data = complete(json!({"date": "15/01/2024"}));
        assert_eq!(data["date"], json!("2024-01-15"));
    }

    #[test]
    fn non_mapping_info_sections_are_replaced() {
        let data = complete(json!({
            "buyer_info": "Acme Corp",
            "supplier_info": null,
            "payment_terms": [1, 2],
            "additional_info": {"notes": "kept"}
        }));
        assert_eq!(data["buyer_info"], json!({}));
        assert_eq!(data["supplier_info"], json!({}));
        assert_eq!(data["payment_terms"], json!({}));
        assert_eq!(data["additional_info"], json!({"notes": "kept"}));
    }

    #[test]
    fn quantity_conversion_floors_at_one() {
        assert_eq!(to_quantity(Some(&json!(-3))), 1);
        assert_eq!(to_quantity(Some(&json!(0))), 1);
        assert_eq!(to_quantity(Some(&json!("2.9"))), 2);
        assert_eq!(to_quantity(Some(&json!("1,000"))), 1000);
        assert_eq!(to_quantity(Some(&json!("many"))), 1);
        assert_eq!(to_quantity(None), 1);
    }

    #[test]
    fn completion_is_idempotent() {
        let mut first = match json!({
            "invoice_number": "INV-7",
            "date": "15/01/2024",
            "items": [
                {"product_name": "Widget", "quantity": "2", "unit_price": "5", "amount": "10"},
                {"product_name": ""}
            ],
            "subtotal": 0,
            "tax_amount": "1,30",
            "total_amount": 0,
            "buyer_info": "not a mapping"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        complete_schema(&mut first);
        let mut second = first.clone();
        complete_schema(&mut second);
        assert_eq!(first, second);
    }
}
