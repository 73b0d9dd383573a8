//! Amount and date normalisation.
//!
//! The model reports values the way the invoice prints them: `"$1,234.56"`,
//! `"1.234,56"`, `"15/01/2024"`, `"2024年1月15日"`. These functions fold that
//! variety into canonical forms — `f64` amounts and ISO `YYYY-MM-DD` date
//! strings — and they never fail: garbage amounts become `0.0`, unparseable
//! dates are returned verbatim so no information is destroyed.

use chrono::NaiveDate;
use serde_json::Value;

/// Candidate date formats, tried strictly in order. D/M/Y deliberately
/// precedes M/D/Y; ambiguous numeric dates resolve by list position, never by
/// guessing.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%Y年%m月%d日",
    "%Y.%m.%d",
];

/// Normalise an arbitrary JSON value into a monetary amount.
///
/// `null` → `0.0`; numbers pass through as `f64`; strings are cleaned of
/// currency symbols and separators and parsed. Anything unparseable yields
/// `0.0` — this function is the absorbing boundary for numeric garbage.
pub fn normalize_amount(value: &Value) -> f64 {
    let amount = match value {
        Value::Null => 0.0,
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_amount_str(s),
        _ => 0.0,
    };
    // NaN/inf can sneak in via strings like "inf"; the schema wants plain
    // non-negative-ish finite floats.
    if amount.is_finite() {
        amount
    } else {
        0.0
    }
}

/// Parse a monetary string in US, European, or plain notation.
///
/// Separator disambiguation:
/// - both `.` and `,` present — whichever comes last is the decimal
///   separator (`1,234.56` vs `1.234,56`)
/// - a single `,` and no `.` — decimal comma (`1234,56`), unless it groups
///   exactly three trailing digits, which is the thousands convention
///   (`1,000`)
fn parse_amount_str(s: &str) -> f64 {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | '¥' | '€' | '£') && !c.is_whitespace())
        .collect();

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');

    let candidate = match (last_dot, last_comma) {
        (Some(d), Some(c)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches(',').count() == 1 => {
            let trailing = cleaned.rsplit(',').next().map(str::len).unwrap_or(0);
            if trailing == 3 {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            }
        }
        _ => cleaned.replace(',', ""),
    };

    candidate.parse::<f64>().unwrap_or(0.0)
}

/// Normalise an arbitrary JSON value into an ISO `YYYY-MM-DD` date string.
///
/// Empty/null input yields an empty string. Otherwise the stringified value
/// is matched against [`DATE_FORMATS`] in order and the first hit is
/// reformatted; if nothing matches, the (trimmed) original is returned
/// unchanged.
pub fn normalize_date(value: &Value) -> String {
    let raw = match value {
        Value::Null => return String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return String::new(),
    };
    if raw.is_empty() {
        return String::new();
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&raw, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }

    raw
}
