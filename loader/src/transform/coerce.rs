//! Cell value coercion.
//!
//! Rules are tried in order and the first match wins:
//!
//! 1. only ASCII digits → `int` (values past `i64` fall through to 2)
//! 2. parses as a finite float (after trimming) → `float`
//! 3. trimmed text starts with `{` / `[` and is valid JSON → `json`, re-serialized
//! 4. anything else → `string`, or null for an empty cell
//!
//! Leading zeros are not preserved: `"007"` becomes `int 7`.

use serde_json::Value;

use crate::models::{ConsentValue, TypedValue};

/// Consent states that are not persisted as text.
const CONSENT_SENTINELS: [&str; 2] = ["granted", "denied"];

/// Coerce one raw cell.
pub fn coerce(raw: &str) -> TypedValue {
    if let Some(i) = parse_digits(raw) {
        return TypedValue::Int(i);
    }
    if let Some(f) = parse_float(raw) {
        return TypedValue::Float(f);
    }
    if let Some(json) = canonical_json(raw) {
        return TypedValue::Json(json);
    }
    if raw.is_empty() {
        TypedValue::Null
    } else {
        TypedValue::String(raw.to_string())
    }
}

/// Coerce one `consent_data.*` cell: the text is kept as-is, except the
/// `granted` / `denied` sentinels which become null. An empty cell stays an
/// empty string.
pub fn coerce_consent(raw: &str) -> ConsentValue {
    let string = if CONSENT_SENTINELS.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    };
    ConsentValue { string }
}

fn parse_digits(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn canonical_json(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }
    let value: Value = serde_json::from_str(trimmed).ok()?;
    serde_json::to_string(&value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_become_int() {
        assert_eq!(coerce("42"), TypedValue::Int(42));
        assert_eq!(coerce("0"), TypedValue::Int(0));
        assert_eq!(coerce("007"), TypedValue::Int(7));

        let value = coerce("1714521600000");
        assert_eq!(value.as_int(), Some(1_714_521_600_000));
        assert!(value.as_float().is_none());
        assert!(value.as_string().is_none());
        assert!(value.as_json().is_none());
    }

    #[test]
    fn test_int_overflow_falls_back_to_float() {
        let value = coerce("99999999999999999999");
        assert!(value.as_int().is_none());
        assert_eq!(value.as_float(), Some(1e20));
    }

    #[test]
    fn test_signed_decimal_and_exponent_become_float() {
        assert_eq!(coerce("-3"), TypedValue::Float(-3.0));
        assert_eq!(coerce("2.5"), TypedValue::Float(2.5));
        assert_eq!(coerce("1e3"), TypedValue::Float(1000.0));
        assert_eq!(coerce(" 12 "), TypedValue::Float(12.0));
        assert!(coerce("-3").as_int().is_none());
    }

    #[test]
    fn test_non_finite_numbers_stay_text() {
        assert_eq!(coerce("NaN"), TypedValue::String("NaN".into()));
        assert_eq!(coerce("inf"), TypedValue::String("inf".into()));
    }

    #[test]
    fn test_json_is_reserialized() {
        let value = coerce(r#" { "b": 1,  "a": [true, null] } "#);
        assert_eq!(value, TypedValue::Json(r#"{"a":[true,null],"b":1}"#.into()));

        assert_eq!(coerce("[1, 2,3]"), TypedValue::Json("[1,2,3]".into()));
    }

    #[test]
    fn test_json_roundtrip_is_stable() {
        let first = coerce(r#"{"items": [{"id": 1, "price": 9.5}], "currency": "EUR"}"#);
        let text = first.as_json().unwrap();
        let reparsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(serde_json::to_string(&reparsed).unwrap(), text);
    }

    #[test]
    fn test_invalid_json_stays_string() {
        assert_eq!(coerce("{not json"), TypedValue::String("{not json".into()));
        assert_eq!(coerce("[1, 2"), TypedValue::String("[1, 2".into()));
    }

    #[test]
    fn test_plain_text_and_empty() {
        assert_eq!(coerce("bar"), TypedValue::String("bar".into()));
        assert_eq!(coerce(" padded "), TypedValue::String(" padded ".into()));
        assert!(coerce("").is_null());
    }

    #[test]
    fn test_consent_sentinels_are_nulled() {
        assert_eq!(coerce_consent("granted").string, None);
        assert_eq!(coerce_consent("denied").string, None);
        assert_eq!(coerce_consent("").string.as_deref(), Some(""));
        assert_eq!(coerce_consent("Granted").string.as_deref(), Some("Granted"));
        assert_eq!(coerce_consent("42").string.as_deref(), Some("42"));
    }
}
