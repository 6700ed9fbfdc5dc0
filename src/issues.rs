//! Issue model
//!
//! Raw issues are produced while a value travels through a schema. At the end
//! of a parse they are finalized into strongly typed [`FinalizedIssue`]s, with
//! messages resolved through the error-map chain:
//!
//! 1. a message already present on the raw issue
//! 2. the error map of the schema or check that produced it
//! 3. the per-call error map of the [`ParseContext`]
//! 4. the process-global custom error map
//! 5. the process-global locale error map (built-in English by default)

use crate::config;
use crate::locales;
use crate::validators::validation::ParseContext;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Issue codes
// =============================================================================

/// Closed set of issue codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// Input has the wrong type
    InvalidType,
    /// Input is not one of the permitted literal values
    InvalidValue,
    /// String does not match the expected format
    InvalidFormat,
    /// No union alternative matched
    InvalidUnion,
    /// A record key failed validation
    InvalidKey,
    /// A collection element failed validation
    InvalidElement,
    /// Value exceeds an upper bound
    TooBig,
    /// Value is below a lower bound
    TooSmall,
    /// Number is not a multiple of the divisor
    NotMultipleOf,
    /// Object contains keys not declared in the shape
    UnrecognizedKeys,
    /// Discriminator value selects no alternative
    InvalidDiscriminator,
    /// Intersection results cannot be merged
    IncompatibleTypes,
    /// User-defined failure
    Custom,
}

impl IssueCode {
    /// Get the code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::InvalidType => "invalid_type",
            IssueCode::InvalidValue => "invalid_value",
            IssueCode::InvalidFormat => "invalid_format",
            IssueCode::InvalidUnion => "invalid_union",
            IssueCode::InvalidKey => "invalid_key",
            IssueCode::InvalidElement => "invalid_element",
            IssueCode::TooBig => "too_big",
            IssueCode::TooSmall => "too_small",
            IssueCode::NotMultipleOf => "not_multiple_of",
            IssueCode::UnrecognizedKeys => "unrecognized_keys",
            IssueCode::InvalidDiscriminator => "invalid_discriminator",
            IssueCode::IncompatibleTypes => "incompatible_types",
            IssueCode::Custom => "custom",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Paths
// =============================================================================

/// One step of a path into a composite value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object or record key
    Key(String),
    /// Sequence index
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{}", k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

// =============================================================================
// Error maps
// =============================================================================

/// Message function consulted during finalization
///
/// Returning `None` defers to the next level of the resolution chain.
#[derive(Clone)]
pub struct ErrorMap(Arc<dyn Fn(&RawIssue) -> Option<String> + Send + Sync>);

impl ErrorMap {
    /// Wrap a message function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Error map that always yields the same message
    pub fn message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Some(message.clone()))
    }

    /// Resolve a message for an issue
    pub fn resolve(&self, issue: &RawIssue) -> Option<String> {
        (self.0)(issue).filter(|m| !m.is_empty())
    }
}

impl fmt::Debug for ErrorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorMap(..)")
    }
}

impl From<&str> for ErrorMap {
    fn from(message: &str) -> Self {
        ErrorMap::message(message)
    }
}

impl From<String> for ErrorMap {
    fn from(message: String) -> Self {
        ErrorMap::message(message)
    }
}

// =============================================================================
// Raw issues
// =============================================================================

/// What produced an issue
#[derive(Debug, Clone)]
pub struct IssueSource {
    /// Schema type code or check kind
    pub kind: String,
    /// Error map of the producing schema or check
    pub error_map: Option<ErrorMap>,
}

/// An issue as produced during parsing, before finalization
#[derive(Debug, Clone)]
pub struct RawIssue {
    /// Issue code
    pub code: IssueCode,
    /// The offending input
    pub input: Option<Value>,
    /// Path from the root to the offending node
    pub path: Vec<PathSegment>,
    /// Explicit message, bypassing error maps
    pub message: Option<String>,
    /// Kind-specific properties
    pub properties: IndexMap<String, Value>,
    /// `false` if this issue aborts further processing of its value
    pub continuable: bool,
    /// Producer of the issue
    pub source: Option<IssueSource>,
    /// Finalized issues per union alternative
    pub branches: Vec<Vec<FinalizedIssue>>,
    /// Finalized nested issues (record keys)
    pub nested: Vec<FinalizedIssue>,
}

impl RawIssue {
    /// Create a continuable issue with the given code
    pub fn new(code: IssueCode) -> Self {
        Self {
            code,
            input: None,
            path: Vec::new(),
            message: None,
            properties: IndexMap::new(),
            continuable: true,
            source: None,
            branches: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// `invalid_type` issue for an expected type and the received value
    pub fn invalid_type(expected: impl Into<String>, input: &Value) -> Self {
        Self::new(IssueCode::InvalidType)
            .with_input(input.clone())
            .with_property("expected", expected.into())
            .with_property("received", input.type_name())
            .abort()
    }

    /// `custom` issue with a message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(IssueCode::Custom).with_message(message)
    }

    /// Set the offending input
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    /// Set a relative path (prefixed with the payload path when added)
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Set an explicit message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set a kind-specific property
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Set the producer
    pub fn with_source(mut self, source: IssueSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Mark the issue as aborting
    pub fn abort(mut self) -> Self {
        self.continuable = false;
        self
    }

    /// Get a property
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Get a property in string form, accepting non-string representations
    pub fn property_str(&self, key: &str) -> Option<String> {
        prop_string(&self.properties, key)
    }
}

fn prop_string(props: &IndexMap<String, Value>, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::Nil => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn prop_strings(props: &IndexMap<String, Value>, key: &str) -> Vec<String> {
    match props.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn prop_values(props: &IndexMap<String, Value>, key: &str) -> Vec<Value> {
    match props.get(key) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Nil) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    }
}

// =============================================================================
// Finalized issues
// =============================================================================

fn is_false(b: &bool) -> bool {
    !*b
}

/// Strongly typed, user-visible issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizedIssue {
    /// Issue code
    pub code: IssueCode,
    /// Offending input, present only when input reporting is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    /// Path from the root to the offending node
    pub path: Vec<PathSegment>,
    /// Resolved message
    pub message: String,
    /// Expected type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Received type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    /// Lower bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    /// Upper bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
    /// Whether the bound is inclusive
    #[serde(skip_serializing_if = "is_false")]
    pub inclusive: bool,
    /// Unrecognized keys
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    /// Discriminator options
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
    /// Issues per union alternative
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Vec<FinalizedIssue>>,
    /// Nested issues
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<FinalizedIssue>,
    /// Format name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Divisor for `not_multiple_of`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divisor: Option<Value>,
    /// Regex pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Required prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Required suffix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Required substring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includes: Option<String>,
    /// Permitted literal values
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
    /// Algorithm name (hash or encoding formats)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    /// Kind of value the bound applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Offending key (records, discriminators)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    /// Remaining properties
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, serde_json::Value>,
}

const KNOWN_PROPERTIES: &[&str] = &[
    "expected",
    "received",
    "minimum",
    "maximum",
    "inclusive",
    "keys",
    "options",
    "format",
    "divisor",
    "pattern",
    "prefix",
    "suffix",
    "includes",
    "values",
    "algorithm",
    "origin",
    "key",
];

/// Resolve a message for a raw issue through the error-map chain
pub fn resolve_message(issue: &RawIssue, ctx: &ParseContext) -> String {
    if let Some(message) = issue.message.as_ref().filter(|m| !m.is_empty()) {
        return message.clone();
    }
    if let Some(message) = issue
        .source
        .as_ref()
        .and_then(|s| s.error_map.as_ref())
        .and_then(|map| map.resolve(issue))
    {
        return message;
    }
    if let Some(message) = ctx.error_map.as_ref().and_then(|map| map.resolve(issue)) {
        return message;
    }
    let global = config::config();
    if let Some(message) = global.custom_error.as_ref().and_then(|map| map.resolve(issue)) {
        return message;
    }
    if let Some(message) = global.locale_error.as_ref().and_then(|map| map.resolve(issue)) {
        return message;
    }
    locales::english_message(issue)
}

/// Convert a raw issue into its user-visible form
pub fn finalize(issue: RawIssue, ctx: &ParseContext) -> FinalizedIssue {
    let message = resolve_message(&issue, ctx);
    let props = &issue.properties;
    let params = props
        .iter()
        .filter(|(k, _)| !KNOWN_PROPERTIES.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();

    FinalizedIssue {
        code: issue.code,
        input: if ctx.report_input { issue.input.clone() } else { None },
        path: issue.path.clone(),
        message,
        expected: prop_string(props, "expected"),
        received: prop_string(props, "received"),
        minimum: props.get("minimum").cloned(),
        maximum: props.get("maximum").cloned(),
        inclusive: matches!(props.get("inclusive"), Some(Value::Bool(true))),
        keys: prop_strings(props, "keys"),
        options: prop_values(props, "options"),
        errors: issue.branches.clone(),
        issues: issue.nested.clone(),
        format: prop_string(props, "format"),
        divisor: props.get("divisor").cloned(),
        pattern: prop_string(props, "pattern"),
        prefix: prop_string(props, "prefix"),
        suffix: prop_string(props, "suffix"),
        includes: prop_string(props, "includes"),
        values: prop_values(props, "values"),
        algorithm: prop_string(props, "algorithm"),
        origin: prop_string(props, "origin"),
        key: props.get("key").cloned(),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_serializes_snake_case() {
        let json = serde_json::to_string(&IssueCode::InvalidDiscriminator).unwrap();
        assert_eq!(json, "\"invalid_discriminator\"");
        assert_eq!(IssueCode::TooSmall.to_string(), "too_small");
    }

    #[test]
    fn test_path_serializes_untagged() {
        let path = vec![PathSegment::from("items"), PathSegment::from(2usize)];
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["items",2]"#);
    }

    #[test]
    fn test_explicit_message_wins() {
        let issue = RawIssue::custom("boom").with_source(IssueSource {
            kind: "custom".into(),
            error_map: Some(ErrorMap::message("ignored")),
        });
        assert_eq!(resolve_message(&issue, &ParseContext::new()), "boom");
    }

    #[test]
    fn test_source_map_before_context_map() {
        let issue = RawIssue::new(IssueCode::Custom).with_source(IssueSource {
            kind: "refine".into(),
            error_map: Some(ErrorMap::message("from schema")),
        });
        let ctx = ParseContext::new().with_error_map(ErrorMap::message("from call"));
        assert_eq!(resolve_message(&issue, &ctx), "from schema");
    }

    #[test]
    fn test_context_map_falls_through_on_none() {
        let issue = RawIssue::invalid_type("string", &Value::Int(1));
        let ctx = ParseContext::new().with_error_map(ErrorMap::new(|issue| {
            (issue.code == IssueCode::TooBig).then(|| "big".to_string())
        }));
        assert_eq!(
            resolve_message(&issue, &ctx),
            "Invalid input: expected string, received number"
        );
    }

    #[test]
    fn test_finalize_copies_typed_fields() {
        let issue = RawIssue::new(IssueCode::TooSmall)
            .with_input(Value::from("a"))
            .with_property("minimum", 2i64)
            .with_property("inclusive", true)
            .with_property("origin", "string")
            .with_property("exact", false);
        let finalized = finalize(issue, &ParseContext::new());
        assert_eq!(finalized.minimum, Some(Value::Int(2)));
        assert!(finalized.inclusive);
        assert_eq!(finalized.origin.as_deref(), Some("string"));
        assert_eq!(finalized.params.get("exact"), Some(&serde_json::Value::Bool(false)));
        assert!(finalized.input.is_none());
    }

    #[test]
    fn test_finalize_reports_input_when_requested() {
        let issue = RawIssue::invalid_type("string", &Value::Int(7));
        let finalized = finalize(issue, &ParseContext::new().with_report_input(true));
        assert_eq!(finalized.input, Some(Value::Int(7)));
        assert_eq!(finalized.received.as_deref(), Some("number"));
    }

    #[test]
    fn test_tolerant_expected_extraction() {
        let issue = RawIssue::new(IssueCode::InvalidType).with_property("expected", 5i64);
        let finalized = finalize(issue, &ParseContext::new());
        assert_eq!(finalized.expected.as_deref(), Some("5"));
    }
}
