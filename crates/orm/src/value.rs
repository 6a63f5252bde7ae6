//! Attribute values and the comparison rules used by dirty tracking

use std::collections::HashMap;

use serde_json::{Number, Value};

/// A flat column → value mapping, as produced and consumed by every backend
pub type Row = HashMap<String, Value>;

/// Whether a value is a number or a string that reads as one.
///
/// Leading and trailing whitespace is tolerated; hexadecimal, `inf` and `nan`
/// are not numeric.
pub fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => is_numeric_str(s),
        _ => false,
    }
}

fn is_numeric_str(s: &str) -> bool {
    let s = s.trim_matches(|c: char| c == ' ' || c == '\t' || c == '\n' || c == '\r' || c == '\x0b' || c == '\x0c');
    let bytes = s.as_bytes();
    let mut i = 0;

    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }

    if digits == 0 {
        return false;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

/// String form used when comparing numeric values
fn numeric_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(number_string(n)),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Integral floats render without a fractional part, so `10.0` reads `"10"`
fn number_string(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

/// Equivalence between a current and an original attribute value.
///
/// Exact equality, or both numeric with byte-equal string forms, so `1` and
/// `"1"` match while `"1.0"` and `"1"` do not. A current `null` only matches an
/// original `null`.
pub fn is_equivalent(current: &Value, original: &Value) -> bool {
    if current == original {
        return true;
    }

    if current.is_null() {
        return false;
    }

    if !(is_numeric(current) && is_numeric(original)) {
        return false;
    }

    matches!(
        (numeric_string(current), numeric_string(original)),
        (Some(a), Some(b)) if a == b
    )
}

/// Parse an object identifier.
///
/// Accepts positive integers, positive numeric strings and rows carrying a
/// positive `ID` or `term_id`. Anything else yields `None`.
pub fn parse_object_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .filter(|id| *id > 0),
        Value::String(s) if is_numeric_str(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
                .filter(|id| *id > 0)
        }
        Value::Object(map) => ["ID", "term_id"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(parse_object_id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_numeric() {
        for value in [json!(1), json!(1.5), json!("42"), json!("-3.14"), json!(" 7"), json!("1e3"), json!(".5")] {
            assert!(is_numeric(&value), "{value} should be numeric");
        }
        for value in [json!("abc"), json!(""), json!("0x1A"), json!("1e"), json!(true), json!(null), json!("inf"), json!([1])] {
            assert!(!is_numeric(&value), "{value} should not be numeric");
        }
    }

    #[test]
    fn test_equivalence_rules() {
        assert!(is_equivalent(&json!("foo"), &json!("foo")));
        assert!(is_equivalent(&json!(1), &json!("1")));
        assert!(is_equivalent(&json!("20"), &json!(20)));
        assert!(is_equivalent(&json!(null), &json!(null)));

        assert!(!is_equivalent(&json!("1.0"), &json!("1")));
        assert!(is_equivalent(&json!(10.0), &json!("10")));
        assert!(is_equivalent(&json!(-3.0), &json!(-3)));
        assert!(!is_equivalent(&json!(10.5), &json!("10")));
        assert!(!is_equivalent(&json!(null), &json!(0)));
        assert!(!is_equivalent(&json!(0), &json!(null)));
        assert!(!is_equivalent(&json!(true), &json!(1)));
        assert!(!is_equivalent(&json!(""), &json!(null)));
    }

    #[test]
    fn test_parse_object_id() {
        assert_eq!(parse_object_id(&json!(12)), Some(12));
        assert_eq!(parse_object_id(&json!("12")), Some(12));
        assert_eq!(parse_object_id(&json!({"ID": 5})), Some(5));
        assert_eq!(parse_object_id(&json!({"term_id": "9"})), Some(9));
        assert_eq!(parse_object_id(&json!(0)), None);
        assert_eq!(parse_object_id(&json!(-4)), None);
        assert_eq!(parse_object_id(&json!("abc")), None);
        assert_eq!(parse_object_id(&json!(null)), None);
    }
}
