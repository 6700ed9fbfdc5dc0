//! Validator helper functions
//!
//! Format predicates, leaf coercions, value comparison and the deep merge
//! used by intersections.

use crate::issues::PathSegment;
use crate::value::Value;
use base64::Engine;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;

lazy_static::lazy_static! {
    /// Well-known boolean spellings accepted by coercion
    pub static ref BOOLEAN_MAP: HashMap<&'static str, bool> = {
        let mut m = HashMap::new();
        m.insert("false", false);
        m.insert("0", false);
        m.insert("no", false);
        m.insert("off", false);
        m.insert("true", true);
        m.insert("1", true);
        m.insert("yes", true);
        m.insert("on", true);
        m
    };
}

// =============================================================================
// String formats
// =============================================================================

/// Email pattern (practical subset of RFC 5322)
pub const EMAIL_PATTERN: &str =
    r"^[A-Za-z0-9_'+\-\.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$";

/// UUID pattern (any version, hyphenated)
pub const UUID_PATTERN: &str =
    r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

/// Dotted-quad IPv4 pattern
pub const IPV4_PATTERN: &str =
    r"^((25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\.){3}(25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])$";

lazy_static::lazy_static! {
    /// Compiled [`EMAIL_PATTERN`]
    pub static ref EMAIL_REGEX: regex::Regex = regex::Regex::new(EMAIL_PATTERN).unwrap();
    /// Compiled [`UUID_PATTERN`]
    pub static ref UUID_REGEX: regex::Regex = regex::Regex::new(UUID_PATTERN).unwrap();
    /// Compiled [`IPV4_PATTERN`]
    pub static ref IPV4_REGEX: regex::Regex = regex::Regex::new(IPV4_PATTERN).unwrap();
}

/// Check an email address
pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// Check a UUID
pub fn is_uuid(value: &str) -> bool {
    UUID_REGEX.is_match(value)
}

/// Check an IPv4 address
pub fn is_ipv4(value: &str) -> bool {
    IPV4_REGEX.is_match(value)
}

/// Check an absolute URL with a host
pub fn is_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(url) => url.has_host(),
        Err(_) => false,
    }
}

/// Check standard padded base64
pub fn is_base64(value: &str) -> bool {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .is_ok()
}

/// Check an RFC 3339 timestamp
pub fn is_datetime(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}

// =============================================================================
// Coercions
// =============================================================================

/// Coerce to a string: numbers, bools and times are formatted
pub fn coerce_to_string(value: &Value) -> Option<Value> {
    match value {
        Value::Int(i) => Some(Value::String(i.to_string())),
        Value::Float(f) => Some(Value::String(f.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        Value::Time(t) => Some(Value::String(t.to_rfc3339())),
        _ => None,
    }
}

/// Coerce to an integer: strings are parsed, bools become 0/1, integral floats narrow
pub fn coerce_to_int(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => s.trim().parse::<i64>().ok().map(Value::Int),
        Value::Bool(b) => Some(Value::Int(i64::from(*b))),
        Value::Float(f) if f.fract() == 0.0 && f.is_finite() => {
            if *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                Some(Value::Int(*f as i64))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Coerce to a float: strings are parsed, bools become 0/1
pub fn coerce_to_float(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => s.trim().parse::<f64>().ok().map(Value::Float),
        Value::Bool(b) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
        _ => None,
    }
}

/// Coerce to a bool from well-known spellings and 0/1
pub fn coerce_to_bool(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => BOOLEAN_MAP
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .map(Value::Bool),
        Value::Int(0) => Some(Value::Bool(false)),
        Value::Int(1) => Some(Value::Bool(true)),
        _ => None,
    }
}

/// Coerce to a time from RFC 3339 strings and Unix seconds
pub fn coerce_to_time(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim()).ok().map(Value::Time),
        Value::Int(secs) => Utc
            .timestamp_opt(*secs, 0)
            .single()
            .map(|t| Value::Time(t.fixed_offset())),
        _ => None,
    }
}

/// Parse a time bound given as a string
pub fn parse_time(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

// =============================================================================
// Comparison
// =============================================================================

/// Kind of value a bound applies to, as reported in `origin`
pub fn origin_of(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Int(_) | Value::Float(_) => "number",
        Value::Time(_) => "date",
        Value::Pointer(p) => origin_of(&p.resolve()),
        _ => "value",
    }
}

/// Order two numbers or two times; `None` for anything else
pub fn compare_values(value: &Value, bound: &Value) -> Option<Ordering> {
    match (value, bound) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
        (Value::Time(a), Value::String(b)) => parse_time(b).map(|b| a.cmp(&b)),
        (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Int(i) => Some(Decimal::from(*i)),
        Value::Float(f) => Decimal::from_f64(*f),
        _ => None,
    }
}

/// Whether `value` is a multiple of `divisor`; `None` if not numeric
pub fn is_multiple_of(value: &Value, divisor: &Value) -> Option<bool> {
    match (value, divisor) {
        (Value::Int(_), Value::Int(0)) => Some(false),
        (Value::Int(v), Value::Int(d)) => Some(v.checked_rem(*d).map_or(true, |r| r == 0)),
        _ => {
            value.as_f64()?;
            divisor.as_f64()?;
            match (to_decimal(value), to_decimal(divisor)) {
                (Some(_), Some(d)) if d.is_zero() => Some(false),
                (Some(v), Some(d)) => Some(v.checked_rem(d).map_or(false, |r| r.is_zero())),
                _ => {
                    let (v, d) = (value.as_f64()?, divisor.as_f64()?);
                    Some(d != 0.0 && (v / d).fract() == 0.0)
                }
            }
        }
    }
}

// =============================================================================
// Merge
// =============================================================================

/// Deep-merge two validated values
///
/// Objects merge key-wise, arrays of equal length merge element-wise, equal
/// scalars are kept. Anything else is a conflict reported with its path.
pub fn merge_values(left: Value, right: Value) -> Result<Value, Vec<PathSegment>> {
    let mut path = Vec::new();
    merge_at(left, right, &mut path).map_err(|_| path)
}

fn merge_at(left: Value, right: Value, path: &mut Vec<PathSegment>) -> Result<Value, ()> {
    match (left, right) {
        (Value::Object(mut a), Value::Object(b)) => {
            for (key, right_value) in b {
                match a.get_mut(&key) {
                    Some(slot) => {
                        path.push(PathSegment::Key(key));
                        let left_value = std::mem::take(slot);
                        *slot = merge_at(left_value, right_value, path)?;
                        path.pop();
                    }
                    None => {
                        a.insert(key, right_value);
                    }
                }
            }
            Ok(Value::Object(a))
        }
        (Value::Array(a), Value::Array(b)) if a.len() == b.len() => {
            let mut merged = Vec::with_capacity(a.len());
            for (index, (x, y)) in a.into_iter().zip(b).enumerate() {
                path.push(PathSegment::Index(index));
                merged.push(merge_at(x, y, path)?);
                path.pop();
            }
            Ok(Value::Array(merged))
        }
        (a, b) if a == b => Ok(a),
        _ => Err(()),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_formats() {
        assert!(is_email("ada@example.com"));
        assert!(!is_email("ada@"));
        assert!(is_uuid("123e4567-e89b-12d3-a456-426614174000"));
        assert!(!is_uuid("123e4567"));
        assert!(is_ipv4("192.168.0.1"));
        assert!(!is_ipv4("256.1.1.1"));
        assert!(is_url("https://example.com/a?b=c"));
        assert!(!is_url("not a url"));
        assert!(is_base64("SGVsbG8="));
        assert!(!is_base64("!!!"));
        assert!(is_datetime("2024-01-02T03:04:05Z"));
        assert!(!is_datetime("2024-01-02"));
    }

    #[test]
    fn test_bool_coercion() {
        assert_eq!(coerce_to_bool(&Value::from("yes")), Some(Value::Bool(true)));
        assert_eq!(coerce_to_bool(&Value::from("OFF")), Some(Value::Bool(false)));
        assert_eq!(coerce_to_bool(&Value::Int(1)), Some(Value::Bool(true)));
        assert_eq!(coerce_to_bool(&Value::from("maybe")), None);
        assert_eq!(coerce_to_bool(&Value::Int(2)), None);
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(coerce_to_int(&Value::from(" 42 ")), Some(Value::Int(42)));
        assert_eq!(coerce_to_int(&Value::Float(3.0)), Some(Value::Int(3)));
        assert_eq!(coerce_to_int(&Value::Float(3.5)), None);
        assert_eq!(coerce_to_float(&Value::from("1.5")), Some(Value::Float(1.5)));
        assert_eq!(coerce_to_string(&Value::Int(7)), Some(Value::from("7")));
    }

    #[test]
    fn test_time_coercion() {
        let parsed = coerce_to_time(&Value::from("2024-01-02T03:04:05+02:00")).unwrap();
        assert!(matches!(parsed, Value::Time(_)));
        let epoch = coerce_to_time(&Value::Int(0)).unwrap();
        assert_eq!(epoch, coerce_to_time(&Value::from("1970-01-01T00:00:00Z")).unwrap());
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(&Value::Int(3), &Value::Int(5)), Some(Ordering::Less));
        assert_eq!(compare_values(&Value::Float(5.5), &Value::Int(5)), Some(Ordering::Greater));
        assert_eq!(compare_values(&Value::from("a"), &Value::Int(5)), None);
    }

    #[test]
    fn test_multiple_of() {
        assert_eq!(is_multiple_of(&Value::Int(10), &Value::Int(5)), Some(true));
        assert_eq!(is_multiple_of(&Value::Int(10), &Value::Int(0)), Some(false));
        assert_eq!(is_multiple_of(&Value::Float(0.3), &Value::Float(0.1)), Some(true));
        assert_eq!(is_multiple_of(&Value::Float(0.35), &Value::Float(0.1)), Some(false));
        assert_eq!(is_multiple_of(&Value::from("x"), &Value::Int(2)), None);
    }

    #[test]
    fn test_merge_objects() {
        let left = Value::from(json!({"a": 1, "shared": {"x": 1}}));
        let right = Value::from(json!({"b": 2, "shared": {"y": 2}}));
        let merged = merge_values(left, right).unwrap();
        assert_eq!(merged, Value::from(json!({"a": 1, "shared": {"x": 1, "y": 2}, "b": 2})));
    }

    #[test]
    fn test_merge_conflict_path() {
        let left = Value::from(json!({"a": {"b": 1}}));
        let right = Value::from(json!({"a": {"b": 2}}));
        let path = merge_values(left, right).unwrap_err();
        assert_eq!(path, vec![PathSegment::from("a"), PathSegment::from("b")]);
    }
}
