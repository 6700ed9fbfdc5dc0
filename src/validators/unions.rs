//! Union, discriminated union and intersection schemas

use super::base::{schema_internals, Schema, SchemaRef};
use super::helpers::merge_values;
use super::internals::{SchemaInternals, TypeCode};
use super::parsing::{finalize_issues, parse_schema};
use super::validation::{ParseContext, ParsePayload};
use crate::error::{Error, Result};
use crate::format::format_path;
use crate::issues::{IssueCode, PathSegment, RawIssue};
use crate::value::Value;
use tracing::debug;

// =============================================================================
// Union
// =============================================================================

/// First alternative that parses cleanly wins
#[derive(Debug, Clone)]
pub struct UnionSchema {
    internals: SchemaInternals,
    options: Vec<SchemaRef>,
}

impl UnionSchema {
    /// Create a union over `options` in declaration order
    pub fn new(options: Vec<SchemaRef>) -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Union),
            options,
        }
    }

    /// Alternatives in declaration order
    pub fn options(&self) -> &[SchemaRef] {
        &self.options
    }
}

impl Schema for UnionSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, ctx: &mut ParseContext) {
        let mut branches = Vec::with_capacity(self.options.len());
        for option in &self.options {
            let mut attempt = payload.fork();
            parse_schema(option.as_ref(), &mut attempt, ctx);
            if attempt.issues.is_empty() {
                payload.value = attempt.value;
                payload.short_circuited = attempt.short_circuited;
                return;
            }
            branches.push(finalize_issues(attempt.issues, ctx));
        }

        debug!(
            path = %format_path(&payload.path),
            options = self.options.len(),
            "no union alternative matched"
        );
        let input = payload.value.clone();
        let mut issue = RawIssue::new(IssueCode::InvalidUnion)
            .with_input(input)
            .abort();
        issue.branches = branches;
        payload.add_issue(issue);
    }
}

// =============================================================================
// Discriminated union
// =============================================================================

/// Union whose alternative is selected by the value at a key
#[derive(Debug, Clone)]
pub struct DiscriminatedUnionSchema {
    internals: SchemaInternals,
    key: String,
    options: Vec<SchemaRef>,
    lookup: Vec<(Value, usize)>,
    discriminators: Vec<Value>,
}

impl DiscriminatedUnionSchema {
    /// Build the union, rejecting options without a literal discriminator and
    /// discriminator values claimed by more than one option
    pub fn new(key: impl Into<String>, options: Vec<SchemaRef>) -> Result<Self> {
        let key = key.into();
        let mut lookup: Vec<(Value, usize)> = Vec::new();
        let mut discriminators = Vec::new();

        for (index, option) in options.iter().enumerate() {
            let field = option
                .shape()
                .and_then(|shape| shape.get(&key))
                .ok_or_else(|| {
                    Error::Schema(format!(
                        "option {} of discriminated union has no field \"{}\"",
                        index, key
                    ))
                })?;
            let values = &field.internals().values;
            if values.is_empty() {
                return Err(Error::Schema(format!(
                    "field \"{}\" of option {} is not a literal or enumeration",
                    key, index
                )));
            }
            for value in values {
                if lookup.iter().any(|(claimed, _)| claimed == value) {
                    return Err(Error::Schema(format!(
                        "discriminator value {} is used by more than one option",
                        value
                    )));
                }
                lookup.push((value.clone(), index));
                discriminators.push(value.clone());
            }
        }

        Ok(Self {
            internals: SchemaInternals::new(TypeCode::DiscriminatedUnion),
            key,
            options,
            lookup,
            discriminators,
        })
    }

    /// Discriminator key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Alternatives in declaration order
    pub fn options(&self) -> &[SchemaRef] {
        &self.options
    }

    /// Every discriminator value across all options
    pub fn discriminators(&self) -> &[Value] {
        &self.discriminators
    }

    /// Option claiming `value`; numbers match across int and float
    fn select(&self, value: &Value) -> Option<usize> {
        let value = match value {
            Value::Pointer(p) => p.resolve(),
            other => other.clone(),
        };
        self.lookup
            .iter()
            .find(|(claimed, _)| *claimed == value)
            .map(|(_, index)| *index)
    }
}

impl Schema for DiscriminatedUnionSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, ctx: &mut ParseContext) {
        let found = match &payload.value {
            Value::Object(map) => map.get(&self.key).cloned().unwrap_or_default(),
            other => {
                let issue = RawIssue::invalid_type("object", other);
                payload.add_issue(issue);
                return;
            }
        };

        match self.select(&found) {
            Some(index) => parse_schema(self.options[index].as_ref(), payload, ctx),
            None => {
                debug!(
                    key = %self.key,
                    value = %found,
                    path = %format_path(&payload.path),
                    "unknown discriminator"
                );
                payload.add_issue(
                    RawIssue::new(IssueCode::InvalidDiscriminator)
                        .with_input(found)
                        .with_path(vec![PathSegment::Key(self.key.clone())])
                        .with_property("key", self.key.as_str())
                        .with_property("options", self.discriminators.clone())
                        .abort(),
                );
            }
        }
    }
}

// =============================================================================
// Intersection
// =============================================================================

/// Value satisfying both components, merged
#[derive(Debug, Clone)]
pub struct IntersectionSchema {
    internals: SchemaInternals,
    left: SchemaRef,
    right: SchemaRef,
}

impl IntersectionSchema {
    /// Create an intersection
    pub fn new(left: SchemaRef, right: SchemaRef) -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Intersection),
            left,
            right,
        }
    }
}

impl Schema for IntersectionSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, ctx: &mut ParseContext) {
        let mut left = payload.fork();
        parse_schema(self.left.as_ref(), &mut left, ctx);
        let mut right = payload.fork();
        parse_schema(self.right.as_ref(), &mut right, ctx);

        if !left.issues.is_empty() || !right.issues.is_empty() {
            payload.issues.append(&mut left.issues);
            payload.issues.append(&mut right.issues);
            return;
        }

        match merge_values(left.value, right.value) {
            Ok(merged) => payload.value = merged,
            Err(path) => {
                debug!(
                    path = %format_path(&payload.path),
                    at = %format_path(&path),
                    "intersection results conflict"
                );
                let input = payload.value.clone();
                payload.add_issue(
                    RawIssue::new(IssueCode::IncompatibleTypes)
                        .with_input(input)
                        .with_property(
                            "merge_path",
                            path.iter()
                                .map(|s| match s {
                                    PathSegment::Key(k) => Value::from(k.as_str()),
                                    PathSegment::Index(i) => Value::from(*i),
                                })
                                .collect::<Vec<_>>(),
                        )
                        .abort(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::base::SchemaExt;
    use crate::{int, literal, object, string};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_union_first_success_wins() {
        let schema = UnionSchema::new(vec![int().into_ref(), string().into_ref()]);
        assert_eq!(schema.parse("a").unwrap(), Value::from("a"));
        assert_eq!(schema.parse(3i64).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_union_output_comes_from_winning_branch() {
        let schema = UnionSchema::new(vec![
            string().min(3).trim().into_ref(),
            string().to_uppercase().into_ref(),
        ]);
        assert_eq!(schema.parse("ab").unwrap(), Value::from("AB"));
    }

    #[test]
    fn test_union_failure_lists_branches() {
        let schema = UnionSchema::new(vec![int().into_ref(), string().into_ref()]);
        let err = schema.parse(true).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].code, IssueCode::InvalidUnion);
        assert_eq!(err.issues[0].errors.len(), 2);
        assert_eq!(err.issues[0].errors[0][0].expected.as_deref(), Some("integer"));
        assert_eq!(err.issues[0].errors[1][0].expected.as_deref(), Some("string"));
    }

    fn shapes() -> DiscriminatedUnionSchema {
        DiscriminatedUnionSchema::new(
            "kind",
            vec![
                object()
                    .field("kind", literal("circle"))
                    .field("radius", int().positive())
                    .into_ref(),
                object()
                    .field("kind", literal("square"))
                    .field("side", int())
                    .into_ref(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_discriminated_union_selects_option() {
        let schema = shapes();
        assert!(schema
            .parse(Value::from(json!({"kind": "square", "side": 2})))
            .is_ok());

        let err = schema
            .parse(Value::from(json!({"kind": "circle", "radius": -1})))
            .unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].code, IssueCode::TooSmall);
        assert_eq!(err.issues[0].path, vec![PathSegment::from("radius")]);
    }

    #[test]
    fn test_discriminated_union_unknown_value() {
        let err = shapes()
            .parse(Value::from(json!({"kind": "triangle"})))
            .unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::InvalidDiscriminator);
        assert_eq!(err.issues[0].path, vec![PathSegment::from("kind")]);
        assert_eq!(err.issues[0].options.len(), 2);
        assert_eq!(
            err.message,
            "Invalid discriminator value at key \"kind\": expected one of \"circle\"|\"square\""
        );
    }

    #[test]
    fn test_discriminated_union_numeric_tags() {
        let schema = DiscriminatedUnionSchema::new(
            "version",
            vec![
                object().field("version", literal(1i64)).field("a", string()).into_ref(),
                object().field("version", literal(2i64)).field("b", int()).into_ref(),
            ],
        )
        .unwrap();

        assert!(schema.parse(Value::from(json!({"version": 2.0, "b": 3}))).is_ok());
        let err = schema
            .parse(Value::from(json!({"version": 1.0, "b": 3})))
            .unwrap_err();
        assert_eq!(err.issues[0].path, vec![PathSegment::from("a")]);

        let duplicate = DiscriminatedUnionSchema::new(
            "version",
            vec![
                object().field("version", literal(1i64)).into_ref(),
                object().field("version", literal(1.0)).into_ref(),
            ],
        );
        assert!(matches!(duplicate, Err(Error::Schema(_))));
    }

    #[test]
    fn test_discriminated_union_construction_errors() {
        let missing = DiscriminatedUnionSchema::new("kind", vec![object().into_ref()]);
        assert!(matches!(missing, Err(Error::Schema(_))));

        let duplicate = DiscriminatedUnionSchema::new(
            "kind",
            vec![
                object().field("kind", literal("a")).into_ref(),
                object().field("kind", literal("a")).into_ref(),
            ],
        );
        assert!(matches!(duplicate, Err(Error::Schema(_))));

        let not_literal =
            DiscriminatedUnionSchema::new("kind", vec![object().field("kind", string()).into_ref()]);
        assert!(not_literal.is_err());
    }

    #[test]
    fn test_intersection_merges_objects() {
        let left = object().field("a", int()).passthrough();
        let right = object().field("b", string()).passthrough();
        let schema = IntersectionSchema::new(left.into_ref(), right.into_ref());
        let out = schema
            .parse(Value::from(json!({"a": 1, "b": "x"})))
            .unwrap();
        assert_eq!(out, Value::from(json!({"a": 1, "b": "x"})));
    }

    #[test]
    fn test_intersection_surfaces_component_issues() {
        let schema = IntersectionSchema::new(
            object().field("a", int()).into_ref(),
            object().field("b", string()).into_ref(),
        );
        let err = schema.parse(Value::from(json!({"a": "x"}))).unwrap_err();
        assert_eq!(err.issues.len(), 2);
        assert_eq!(err.issues[0].path, vec![PathSegment::from("a")]);
        assert_eq!(err.issues[1].path, vec![PathSegment::from("b")]);
    }

    #[test]
    fn test_intersection_conflict() {
        let schema = IntersectionSchema::new(
            string().into_ref(),
            string().to_uppercase().into_ref(),
        );
        let err = schema.parse("abc").unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::IncompatibleTypes);
    }
}
