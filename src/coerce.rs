//! Cell coercion helpers shared by the profiler and the chart builder.
//!
//! Two numeric policies coexist on purpose and must stay separate:
//! [`coerce_numeric_or_zero`] feeds aggregation (bad input counts as 0) while
//! [`is_valid_numeric`] decides row validity (bad input rejects the row).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// True for a null cell or a key the row does not carry.
pub fn is_missing(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Missing, or an empty string.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// String form of a cell, as it is used for labels and category keys.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Lenient float parse: the longest numeric prefix after leading whitespace.
///
/// `"12.5kg"` gives `12.5`, `"abc"` gives `None`, `"-Infinity"` gives negative infinity.
pub fn parse_float(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return Some(if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        let mut frac_digits = 0;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
            frac_digits += 1;
        }
        if digits > 0 || frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }
    if digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Numeric reading of a cell under the lenient parse.
pub fn numeric_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float(s),
        _ => None,
    }
}

/// Row-filtering policy: the cell must parse to a finite number.
pub fn is_valid_numeric(value: Option<&Value>) -> bool {
    numeric_value(value).is_some_and(f64::is_finite)
}

/// Aggregation policy: anything that is not a finite number counts as 0.
pub fn coerce_numeric_or_zero(value: Option<&Value>) -> f64 {
    numeric_value(value)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Strict check used for type classification: the whole trimmed cell must be
/// a finite number.
pub fn looks_numeric(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().is_some_and(f64::is_finite),
        Value::String(s) => {
            let t = s.trim();
            !t.is_empty() && t.parse::<f64>().is_ok_and(f64::is_finite)
        }
        _ => false,
    }
}

/// True when the cell parses as a date under RFC 3339, RFC 2822 or one of
/// the supplied chrono formats.
pub fn is_date_like(value: &Value, formats: &[String]) -> bool {
    let Value::String(s) = value else {
        return false;
    };
    let t = s.trim();
    if t.is_empty() {
        return false;
    }
    if DateTime::parse_from_rfc3339(t).is_ok() || DateTime::parse_from_rfc2822(t).is_ok() {
        return true;
    }
    formats.iter().any(|format| {
        NaiveDateTime::parse_from_str(t, format).is_ok()
            || NaiveDate::parse_from_str(t, format).is_ok()
    })
}
