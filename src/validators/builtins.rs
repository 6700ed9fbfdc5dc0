//! Built-in leaf schemas
//!
//! Strings, numbers, booleans, times and the permissive / impossible kinds.
//! Each leaf only decides whether a value has its type (optionally after
//! coercion); constraints are expressed as checks.

use super::base::{accept_leaf, schema_internals, Schema, SchemaExt};
use super::checks;
use super::helpers::{
    coerce_to_bool, coerce_to_float, coerce_to_int, coerce_to_string, coerce_to_time, is_base64,
    is_datetime, is_url, EMAIL_REGEX, IPV4_REGEX, UUID_REGEX,
};
use super::internals::{SchemaInternals, TypeCode};
use super::validation::{ParseContext, ParsePayload};
use crate::issues::RawIssue;
use crate::value::Value;
use regex::Regex;

// =============================================================================
// String
// =============================================================================

/// UTF-8 string schema
#[derive(Debug, Clone)]
pub struct StringSchema {
    internals: SchemaInternals,
}

impl StringSchema {
    /// Create a string schema
    pub fn new() -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::String),
        }
    }

    /// String schema whose pattern must match, reported as `format`
    pub fn with_format(format: &'static str, pattern: Regex) -> Self {
        let mut schema = Self::new();
        schema.internals.pattern = Some(pattern);
        schema
            .internals
            .bag
            .insert("format".to_string(), Value::from(format));
        schema
    }

    /// At least `n` characters
    pub fn min(&self, n: usize) -> Self {
        self.check(checks::min_length(n))
    }

    /// At most `n` characters
    pub fn max(&self, n: usize) -> Self {
        self.check(checks::max_length(n))
    }

    /// Exactly `n` characters
    pub fn length(&self, n: usize) -> Self {
        self.check(checks::length(n))
    }

    /// At least one character
    pub fn nonempty(&self) -> Self {
        self.min(1)
    }

    /// Must match `re`
    pub fn regex(&self, re: Regex) -> Self {
        self.check(checks::regex(re))
    }

    /// Must start with `prefix`
    pub fn starts_with(&self, prefix: impl Into<String>) -> Self {
        self.check(checks::starts_with(prefix))
    }

    /// Must end with `suffix`
    pub fn ends_with(&self, suffix: impl Into<String>) -> Self {
        self.check(checks::ends_with(suffix))
    }

    /// Must contain `needle`
    pub fn includes(&self, needle: impl Into<String>) -> Self {
        self.check(checks::includes(needle))
    }

    /// No uppercase characters
    pub fn lowercase(&self) -> Self {
        self.check(checks::lowercase())
    }

    /// No lowercase characters
    pub fn uppercase(&self) -> Self {
        self.check(checks::uppercase())
    }

    /// Email address
    pub fn email(&self) -> Self {
        self.check(checks::string_format("email", |s| EMAIL_REGEX.is_match(s)))
    }

    /// Hyphenated UUID
    pub fn uuid(&self) -> Self {
        self.check(checks::string_format("uuid", |s| UUID_REGEX.is_match(s)))
    }

    /// Absolute URL
    pub fn url(&self) -> Self {
        self.check(checks::string_format("url", is_url))
    }

    /// Dotted-quad IPv4 address
    pub fn ipv4(&self) -> Self {
        self.check(checks::string_format("ipv4", |s| IPV4_REGEX.is_match(s)))
    }

    /// Standard padded base64
    pub fn base64(&self) -> Self {
        self.check(checks::string_format("base64", is_base64))
    }

    /// RFC 3339 timestamp
    pub fn datetime(&self) -> Self {
        self.check(checks::string_format("datetime", is_datetime))
    }

    /// Strip surrounding whitespace
    pub fn trim(&self) -> Self {
        self.overwrite(|v| match v {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other,
        })
    }

    /// Lowercase the string
    pub fn to_lowercase(&self) -> Self {
        self.overwrite(|v| match v {
            Value::String(s) => Value::String(s.to_lowercase()),
            other => other,
        })
    }

    /// Uppercase the string
    pub fn to_uppercase(&self) -> Self {
        self.overwrite(|v| match v {
            Value::String(s) => Value::String(s.to_uppercase()),
            other => other,
        })
    }
}

impl Default for StringSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema for StringSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, _ctx: &mut ParseContext) {
        accept_leaf(self, payload, |v| matches!(v, Value::String(_)));
    }

    fn coerce_value(&self, value: &Value) -> Option<Value> {
        coerce_to_string(value)
    }
}

// =============================================================================
// Numbers
// =============================================================================

/// Signed integer schema
#[derive(Debug, Clone)]
pub struct IntSchema {
    internals: SchemaInternals,
}

impl IntSchema {
    /// Create an integer schema
    pub fn new() -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Integer),
        }
    }

    /// Greater than `n`
    pub fn gt(&self, n: i64) -> Self {
        self.check(checks::gt(n))
    }

    /// Greater than or equal to `n`
    pub fn gte(&self, n: i64) -> Self {
        self.check(checks::gte(n))
    }

    /// Alias of [`IntSchema::gte`]
    pub fn min(&self, n: i64) -> Self {
        self.gte(n)
    }

    /// Less than `n`
    pub fn lt(&self, n: i64) -> Self {
        self.check(checks::lt(n))
    }

    /// Less than or equal to `n`
    pub fn lte(&self, n: i64) -> Self {
        self.check(checks::lte(n))
    }

    /// Alias of [`IntSchema::lte`]
    pub fn max(&self, n: i64) -> Self {
        self.lte(n)
    }

    /// Greater than zero
    pub fn positive(&self) -> Self {
        self.gt(0)
    }

    /// Less than zero
    pub fn negative(&self) -> Self {
        self.lt(0)
    }

    /// Zero or more
    pub fn nonnegative(&self) -> Self {
        self.gte(0)
    }

    /// Zero or less
    pub fn nonpositive(&self) -> Self {
        self.lte(0)
    }

    /// Divisible by `n`
    pub fn multiple_of(&self, n: i64) -> Self {
        self.check(checks::multiple_of(n))
    }
}

impl Default for IntSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema for IntSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, _ctx: &mut ParseContext) {
        accept_leaf(self, payload, |v| matches!(v, Value::Int(_)));
    }

    fn coerce_value(&self, value: &Value) -> Option<Value> {
        coerce_to_int(value)
    }
}

/// Floating point schema; integers are accepted and widened
#[derive(Debug, Clone)]
pub struct FloatSchema {
    internals: SchemaInternals,
}

impl FloatSchema {
    /// Create a float schema
    pub fn new() -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Float),
        }
    }

    /// Greater than `n`
    pub fn gt(&self, n: f64) -> Self {
        self.check(checks::gt(n))
    }

    /// Greater than or equal to `n`
    pub fn gte(&self, n: f64) -> Self {
        self.check(checks::gte(n))
    }

    /// Alias of [`FloatSchema::gte`]
    pub fn min(&self, n: f64) -> Self {
        self.gte(n)
    }

    /// Less than `n`
    pub fn lt(&self, n: f64) -> Self {
        self.check(checks::lt(n))
    }

    /// Less than or equal to `n`
    pub fn lte(&self, n: f64) -> Self {
        self.check(checks::lte(n))
    }

    /// Alias of [`FloatSchema::lte`]
    pub fn max(&self, n: f64) -> Self {
        self.lte(n)
    }

    /// Greater than zero
    pub fn positive(&self) -> Self {
        self.gt(0.0)
    }

    /// Less than zero
    pub fn negative(&self) -> Self {
        self.lt(0.0)
    }

    /// Zero or more
    pub fn nonnegative(&self) -> Self {
        self.gte(0.0)
    }

    /// Zero or less
    pub fn nonpositive(&self) -> Self {
        self.lte(0.0)
    }

    /// Divisible by `n`, using exact decimal arithmetic
    pub fn multiple_of(&self, n: f64) -> Self {
        self.check(checks::multiple_of(n))
    }

    /// Neither infinite nor NaN
    pub fn finite(&self) -> Self {
        self.check(checks::finite())
    }
}

impl Default for FloatSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema for FloatSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, _ctx: &mut ParseContext) {
        if let Value::Int(i) = payload.value {
            payload.value = Value::Float(i as f64);
            return;
        }
        accept_leaf(self, payload, |v| matches!(v, Value::Float(_)));
    }

    fn coerce_value(&self, value: &Value) -> Option<Value> {
        coerce_to_float(value)
    }
}

// =============================================================================
// Bool and time
// =============================================================================

/// Boolean schema
#[derive(Debug, Clone)]
pub struct BoolSchema {
    internals: SchemaInternals,
}

impl BoolSchema {
    /// Create a boolean schema
    pub fn new() -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Bool),
        }
    }
}

impl Default for BoolSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema for BoolSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, _ctx: &mut ParseContext) {
        accept_leaf(self, payload, |v| matches!(v, Value::Bool(_)));
    }

    fn coerce_value(&self, value: &Value) -> Option<Value> {
        coerce_to_bool(value)
    }
}

/// Timestamp schema
#[derive(Debug, Clone)]
pub struct TimeSchema {
    internals: SchemaInternals,
}

impl TimeSchema {
    /// Create a time schema
    pub fn new() -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Time),
        }
    }

    /// Not before `bound`
    pub fn min(&self, bound: impl Into<Value>) -> Self {
        self.check(checks::gte(bound))
    }

    /// Not after `bound`
    pub fn max(&self, bound: impl Into<Value>) -> Self {
        self.check(checks::lte(bound))
    }
}

impl Default for TimeSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema for TimeSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, _ctx: &mut ParseContext) {
        accept_leaf(self, payload, |v| matches!(v, Value::Time(_)));
    }

    fn coerce_value(&self, value: &Value) -> Option<Value> {
        coerce_to_time(value)
    }
}

// =============================================================================
// Nil, any, unknown, never
// =============================================================================

/// Accepts only nil
#[derive(Debug, Clone)]
pub struct NilSchema {
    internals: SchemaInternals,
}

impl NilSchema {
    /// Create a nil schema
    pub fn new() -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Nil),
        }
    }
}

impl Default for NilSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema for NilSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, _ctx: &mut ParseContext) {
        accept_leaf(self, payload, Value::is_nil);
    }
}

/// Accepts every value (`any` and `unknown`)
#[derive(Debug, Clone)]
pub struct AnySchema {
    internals: SchemaInternals,
}

impl AnySchema {
    /// Create an `any` schema
    pub fn any() -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Any),
        }
    }

    /// Create an `unknown` schema
    pub fn unknown() -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Unknown),
        }
    }
}

impl Schema for AnySchema {
    schema_internals!();

    fn parse_value(&self, _payload: &mut ParsePayload, _ctx: &mut ParseContext) {}
}

/// Accepts no value
#[derive(Debug, Clone)]
pub struct NeverSchema {
    internals: SchemaInternals,
}

impl NeverSchema {
    /// Create a never schema
    pub fn new() -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Never),
        }
    }
}

impl Default for NeverSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema for NeverSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, _ctx: &mut ParseContext) {
        let issue = RawIssue::invalid_type("never", &payload.value);
        payload.add_issue(issue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::IssueCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_string_type_check() {
        assert_eq!(StringSchema::new().parse("a").unwrap(), Value::from("a"));
        let err = StringSchema::new().parse(42i64).unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::InvalidType);
        assert_eq!(err.issues[0].expected.as_deref(), Some("string"));
        assert_eq!(err.issues[0].received.as_deref(), Some("number"));
    }

    #[test]
    fn test_string_checks_accumulate() {
        let schema = StringSchema::new().min(5).starts_with("x").email();
        let err = schema.parse("abc").unwrap_err();
        assert_eq!(err.issues.len(), 3);
        assert_eq!(err.issues[2].format.as_deref(), Some("email"));
    }

    #[test]
    fn test_string_coercion() {
        let schema = StringSchema::new().coerce();
        assert_eq!(schema.parse(12i64).unwrap(), Value::from("12"));
        assert_eq!(schema.parse(true).unwrap(), Value::from("true"));
        assert!(schema.parse(vec![1i64]).is_err());
    }

    #[test]
    fn test_trim_then_length() {
        let schema = StringSchema::new().trim().min(2);
        assert_eq!(schema.parse("  ab  ").unwrap(), Value::from("ab"));
        assert!(schema.parse("  a  ").is_err());
    }

    #[test]
    fn test_format_leaf_uses_pattern() {
        let schema = StringSchema::with_format("email", EMAIL_REGEX.clone());
        assert!(schema.parse("ada@example.com").is_ok());
        let err = schema.parse("nope").unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::InvalidFormat);
        assert_eq!(err.issues[0].format.as_deref(), Some("email"));
        assert_eq!(err.message, "Invalid email");
    }

    #[test]
    fn test_int_bounds_and_coercion() {
        let schema = IntSchema::new().min(18).max(120);
        assert!(schema.parse(25i64).is_ok());
        let err = schema.parse(15i64).unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::TooSmall);
        assert_eq!(err.issues[0].minimum, Some(Value::Int(18)));
        assert!(schema.parse("25").is_err());
        assert_eq!(schema.coerce().parse("25").unwrap(), Value::Int(25));
        assert!(IntSchema::new().parse(1.5).is_err());
    }

    #[test]
    fn test_float_widens_ints() {
        assert_eq!(FloatSchema::new().parse(3i64).unwrap(), Value::Float(3.0));
        assert!(FloatSchema::new().positive().parse(-0.5).is_err());
        assert!(FloatSchema::new().finite().parse(f64::INFINITY).is_err());
        assert!(FloatSchema::new().multiple_of(0.25).parse(1.75).is_ok());
    }

    #[test]
    fn test_bool_coercion() {
        let schema = BoolSchema::new().coerce();
        assert_eq!(schema.parse("on").unwrap(), Value::Bool(true));
        assert_eq!(schema.parse(0i64).unwrap(), Value::Bool(false));
        assert!(BoolSchema::new().parse("true").is_err());
    }

    #[test]
    fn test_time_bounds() {
        let schema = TimeSchema::new().coerce().min("2024-01-01T00:00:00Z");
        assert!(schema.parse("2024-06-01T00:00:00Z").is_ok());
        let err = schema.parse("2023-06-01T00:00:00Z").unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::TooSmall);
        assert_eq!(err.issues[0].origin.as_deref(), Some("date"));
    }

    #[test]
    fn test_nil_any_never() {
        assert_eq!(NilSchema::new().parse(Value::Nil).unwrap(), Value::Nil);
        assert!(NilSchema::new().parse(0i64).is_err());
        assert!(AnySchema::any().parse(Value::Nil).is_ok());
        assert!(AnySchema::unknown().parse(vec![1i64]).is_ok());
        assert!(NeverSchema::new().parse(1i64).is_err());
        assert!(NeverSchema::new().parse(Value::Nil).is_err());
    }
}
