//! Object and record schemas
//!
//! Objects validate a declared set of fields and apply an unknown-key policy
//! to everything else. Records validate every entry against one key schema and
//! one value schema.

use super::base::{derive_ref, schema_internals, IntoSchemaRef, Schema, SchemaExt, SchemaRef};
use super::checks;
use super::internals::{OptionalityMode, SchemaInternals, TypeCode};
use super::parsing::{finalize_issues, parse_at, parse_schema};
use super::validation::{ParseContext, ParsePayload};
use crate::issues::{IssueCode, PathSegment, RawIssue};
use crate::value::Value;
use indexmap::IndexMap;

/// What happens to keys not declared in an object's shape
#[derive(Debug, Clone, Default)]
pub enum UnknownKeys {
    /// Drop them from the output
    #[default]
    Strip,
    /// Report them as `unrecognized_keys`
    Strict,
    /// Keep them untouched
    Passthrough,
    /// Validate them against a schema and keep them
    Catchall(SchemaRef),
}

// =============================================================================
// Object
// =============================================================================

/// Object schema with a declared shape
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    internals: SchemaInternals,
    shape: IndexMap<String, SchemaRef>,
    unknown_keys: UnknownKeys,
}

impl ObjectSchema {
    /// Create an object schema with no fields
    pub fn new() -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Object),
            shape: IndexMap::new(),
            unknown_keys: UnknownKeys::default(),
        }
    }

    fn with<F: FnOnce(&mut Self)>(&self, edit: F) -> Self {
        let mut next = self.clone();
        next.internals.refresh_id();
        edit(&mut next);
        next
    }

    /// Add or replace a field
    pub fn field(&self, key: impl Into<String>, schema: impl IntoSchemaRef) -> Self {
        let key = key.into();
        let schema = schema.into_schema_ref();
        self.with(|o| {
            o.shape.insert(key, schema);
        })
    }

    /// Add or replace several fields
    pub fn extend<I, K>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaRef)>,
        K: Into<String>,
    {
        self.with(|o| {
            for (key, schema) in fields {
                o.shape.insert(key.into(), schema);
            }
        })
    }

    /// Fields of `other` override ours; its unknown-key policy wins
    pub fn merge(&self, other: &ObjectSchema) -> Self {
        self.with(|o| {
            for (key, schema) in &other.shape {
                o.shape.insert(key.clone(), schema.clone());
            }
            o.unknown_keys = other.unknown_keys.clone();
        })
    }

    /// Keep only the listed fields
    pub fn pick(&self, keys: &[&str]) -> Self {
        self.with(|o| o.shape.retain(|k, _| keys.contains(&k.as_str())))
    }

    /// Drop the listed fields
    pub fn omit(&self, keys: &[&str]) -> Self {
        self.with(|o| o.shape.retain(|k, _| !keys.contains(&k.as_str())))
    }

    /// Make every field optional
    pub fn partial(&self) -> Self {
        self.with(|o| {
            for schema in o.shape.values_mut() {
                *schema = derive_ref(schema, |i| i.set_optional());
            }
        })
    }

    /// Make every field non-optional
    pub fn required(&self) -> Self {
        self.with(|o| {
            for schema in o.shape.values_mut() {
                *schema = derive_ref(schema, |i| i.set_non_optional());
            }
        })
    }

    /// Declared keys in order
    pub fn keys(&self) -> Vec<&str> {
        self.shape.keys().map(String::as_str).collect()
    }

    /// Keys that must be present on the given side
    pub fn required_keys(&self, mode: OptionalityMode) -> Vec<&str> {
        self.shape
            .iter()
            .filter(|(_, schema)| !schema.internals().is_optional(mode))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Report unknown keys
    pub fn strict(&self) -> Self {
        self.with(|o| o.unknown_keys = UnknownKeys::Strict)
    }

    /// Drop unknown keys
    pub fn strip(&self) -> Self {
        self.with(|o| o.unknown_keys = UnknownKeys::Strip)
    }

    /// Keep unknown keys
    pub fn passthrough(&self) -> Self {
        self.with(|o| o.unknown_keys = UnknownKeys::Passthrough)
    }

    /// Validate unknown keys against `schema`
    pub fn catchall(&self, schema: impl IntoSchemaRef) -> Self {
        let schema = schema.into_schema_ref();
        self.with(|o| o.unknown_keys = UnknownKeys::Catchall(schema))
    }

    /// Current unknown-key policy
    pub fn unknown_keys(&self) -> &UnknownKeys {
        &self.unknown_keys
    }

    /// Schema of a field
    pub fn get(&self, key: &str) -> Option<&SchemaRef> {
        self.shape.get(key)
    }
}

impl Default for ObjectSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema for ObjectSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, ctx: &mut ParseContext) {
        let mut input = match std::mem::take(&mut payload.value) {
            Value::Object(map) => map,
            other => {
                payload.add_issue(RawIssue::invalid_type("object", &other));
                payload.value = other;
                return;
            }
        };

        let mut output = IndexMap::with_capacity(input.len());
        for (key, field) in &self.shape {
            let value = input.shift_remove(key);
            let present = value.is_some();
            let exact = field.internals().exact_optional;

            if exact && !present {
                continue;
            }
            if exact && matches!(value, Some(Value::Nil)) {
                payload.add_issue(
                    RawIssue::invalid_type(field.type_code().as_str(), &Value::Nil)
                        .with_path(vec![PathSegment::Key(key.clone())]),
                );
                continue;
            }

            let segment = PathSegment::Key(key.clone());
            let parsed = parse_at(field.as_ref(), value.unwrap_or_default(), segment, payload, ctx);
            if present || !parsed.is_nil() {
                output.insert(key.clone(), parsed);
            }
        }

        match &self.unknown_keys {
            UnknownKeys::Strip => {}
            UnknownKeys::Strict => {
                if !input.is_empty() {
                    let keys: Vec<Value> = input.keys().map(|k| Value::from(k.as_str())).collect();
                    payload.add_issue(
                        RawIssue::new(IssueCode::UnrecognizedKeys)
                            .with_input(Value::Object(input.clone()))
                            .with_property("keys", keys),
                    );
                }
            }
            UnknownKeys::Passthrough => output.extend(input),
            UnknownKeys::Catchall(schema) => {
                for (key, value) in input {
                    let segment = PathSegment::Key(key.clone());
                    let parsed = parse_at(schema.as_ref(), value, segment, payload, ctx);
                    output.insert(key, parsed);
                }
            }
        }

        payload.value = Value::Object(output);
    }

    fn shape(&self) -> Option<&IndexMap<String, SchemaRef>> {
        Some(&self.shape)
    }
}

// =============================================================================
// Record
// =============================================================================

/// String-keyed map with uniform keys and values
#[derive(Debug, Clone)]
pub struct RecordSchema {
    internals: SchemaInternals,
    key: SchemaRef,
    value: SchemaRef,
}

impl RecordSchema {
    /// Create a record schema
    pub fn new(key: impl IntoSchemaRef, value: impl IntoSchemaRef) -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Record),
            key: key.into_schema_ref(),
            value: value.into_schema_ref(),
        }
    }

    /// At least `n` entries
    pub fn min_size(&self, n: usize) -> Self {
        self.check(checks::min_length(n))
    }

    /// At most `n` entries
    pub fn max_size(&self, n: usize) -> Self {
        self.check(checks::max_length(n))
    }

    /// Key schema
    pub fn key_schema(&self) -> &SchemaRef {
        &self.key
    }

    /// Value schema
    pub fn value_schema(&self) -> &SchemaRef {
        &self.value
    }
}

impl Schema for RecordSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, ctx: &mut ParseContext) {
        let input = match std::mem::take(&mut payload.value) {
            Value::Object(map) => map,
            other => {
                payload.add_issue(RawIssue::invalid_type("record", &other));
                payload.value = other;
                return;
            }
        };

        let mut output = IndexMap::with_capacity(input.len());
        for (key, value) in input {
            let mut key_payload = ParsePayload::new(Value::from(key.as_str()));
            parse_schema(self.key.as_ref(), &mut key_payload, ctx);
            if !key_payload.issues.is_empty() {
                let nested = finalize_issues(key_payload.issues, ctx);
                let mut issue = RawIssue::new(IssueCode::InvalidKey)
                    .with_input(Value::from(key.as_str()))
                    .with_path(vec![PathSegment::Key(key)])
                    .with_property("origin", "record");
                issue.nested = nested;
                payload.add_issue(issue);
                continue;
            }
            let new_key = match key_payload.value {
                Value::String(s) => s,
                other => other.to_string(),
            };

            let segment = PathSegment::Key(key);
            let parsed = parse_at(self.value.as_ref(), value, segment, payload, ctx);
            output.insert(new_key, parsed);
        }

        payload.value = Value::Object(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{enumeration, int, string};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn user() -> ObjectSchema {
        ObjectSchema::new()
            .field("name", string().min(2))
            .field("age", int().min(18).max(120))
    }

    #[test]
    fn test_valid_object() {
        let out = user().parse(Value::from(json!({"name": "Al", "age": 25}))).unwrap();
        assert_eq!(out, Value::from(json!({"name": "Al", "age": 25})));
    }

    #[test]
    fn test_field_issues_carry_paths() {
        let err = user()
            .parse(Value::from(json!({"name": "A", "age": 15})))
            .unwrap_err();
        let paths: Vec<_> = err.issues.iter().map(|i| i.path.clone()).collect();
        assert_eq!(paths, vec![vec![PathSegment::from("name")], vec![PathSegment::from("age")]]);
        assert!(err.issues.iter().all(|i| i.code == IssueCode::TooSmall));
    }

    #[test]
    fn test_non_object_input() {
        let err = user().parse("nope").unwrap_err();
        assert_eq!(err.issues[0].expected.as_deref(), Some("object"));
        assert!(err.issues[0].path.is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let err = user().parse(Value::from(json!({"name": "Al"}))).unwrap_err();
        assert_eq!(err.issues[0].path, vec![PathSegment::from("age")]);
        assert_eq!(err.issues[0].received.as_deref(), Some("nil"));
    }

    #[test]
    fn test_unknown_key_policies() {
        let input = Value::from(json!({"name": "Al", "age": 30, "extra": 1}));

        let stripped = user().parse(input.clone()).unwrap();
        assert!(stripped.get("extra").is_none());

        let kept = user().passthrough().parse(input.clone()).unwrap();
        assert_eq!(kept.get("extra"), Some(&Value::Int(1)));

        let err = user().strict().parse(input.clone()).unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::UnrecognizedKeys);
        assert_eq!(err.issues[0].keys, vec!["extra".to_string()]);

        let err = user().catchall(string()).parse(input).unwrap_err();
        assert_eq!(err.issues[0].path, vec![PathSegment::from("extra")]);
    }

    #[test]
    fn test_optional_and_default_fields() {
        let schema = ObjectSchema::new()
            .field("nick", string().optional())
            .field("role", string().default("user"));
        let out = schema.parse(Value::from(json!({}))).unwrap();
        assert_eq!(out, Value::from(json!({"role": "user"})));
        assert_eq!(schema.required_keys(OptionalityMode::Input), Vec::<&str>::new());
        assert_eq!(schema.required_keys(OptionalityMode::Output), vec!["role"]);
    }

    #[test]
    fn test_exact_optional() {
        let schema = ObjectSchema::new().field("tag", string().exact_optional());
        assert_eq!(
            schema.parse(Value::from(json!({}))).unwrap(),
            Value::from(json!({}))
        );
        let err = schema.parse(Value::from(json!({"tag": null}))).unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::InvalidType);
        assert_eq!(err.issues[0].path, vec![PathSegment::from("tag")]);
    }

    #[test]
    fn test_shape_operations() {
        let base = user();
        assert_eq!(base.pick(&["name"]).keys(), vec!["name"]);
        assert_eq!(base.omit(&["name"]).keys(), vec!["age"]);
        let extended = base.merge(&ObjectSchema::new().field("email", string()).strict());
        assert_eq!(extended.keys(), vec!["name", "age", "email"]);
        assert!(matches!(extended.unknown_keys(), UnknownKeys::Strict));
        assert_eq!(base.keys(), vec!["name", "age"]);
    }

    #[test]
    fn test_partial_and_required() {
        let partial = user().partial();
        assert!(partial.parse(Value::from(json!({}))).is_ok());
        assert_eq!(partial.required_keys(OptionalityMode::Input), Vec::<&str>::new());

        let required = partial.required();
        assert_eq!(required.required_keys(OptionalityMode::Input), vec!["name", "age"]);
        assert!(required.parse(Value::from(json!({}))).is_err());
    }

    #[test]
    fn test_record_keys_and_values() {
        let schema = RecordSchema::new(
            enumeration(["a", "b"]).unwrap(),
            int(),
        );
        assert!(schema.parse(Value::from(json!({"a": 1, "b": 2}))).is_ok());

        let err = schema.parse(Value::from(json!({"a": "x", "z": 1}))).unwrap_err();
        assert_eq!(err.issues[0].path, vec![PathSegment::from("a")]);
        assert_eq!(err.issues[0].code, IssueCode::InvalidType);
        assert_eq!(err.issues[1].code, IssueCode::InvalidKey);
        assert_eq!(err.issues[1].path, vec![PathSegment::from("z")]);
        assert_eq!(err.issues[1].issues[0].code, IssueCode::InvalidValue);
    }

    #[test]
    fn test_record_size() {
        let schema = RecordSchema::new(string(), int()).min_size(1);
        let err = schema.parse(Value::from(json!({}))).unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::TooSmall);
    }
}
