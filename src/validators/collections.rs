//! Sequence schemas
//!
//! `TupleSchema` validates fixed positions with an optional rest schema;
//! `SliceSchema` validates every element against one schema.

use super::base::{schema_internals, IntoSchemaRef, Schema, SchemaExt, SchemaRef};
use super::checks;
use super::internals::{SchemaInternals, TypeCode};
use super::parsing::parse_at;
use super::validation::{ParseContext, ParsePayload};
use crate::issues::{IssueCode, PathSegment, RawIssue};
use crate::value::Value;

/// Take the payload's sequence, or report `expected` and leave the value alone
fn take_sequence(payload: &mut ParsePayload, expected: &str) -> Option<Vec<Value>> {
    match std::mem::take(&mut payload.value) {
        Value::Array(items) => Some(items),
        other => {
            payload.add_issue(RawIssue::invalid_type(expected, &other));
            payload.value = other;
            None
        }
    }
}

// =============================================================================
// Tuple
// =============================================================================

/// Fixed-position sequence
#[derive(Debug, Clone)]
pub struct TupleSchema {
    internals: SchemaInternals,
    items: Vec<SchemaRef>,
    rest: Option<SchemaRef>,
}

impl TupleSchema {
    /// Create a tuple schema
    pub fn new(items: Vec<SchemaRef>) -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Array),
            items,
            rest: None,
        }
    }

    /// Accept extra trailing elements matching `schema`
    pub fn rest(&self, schema: impl IntoSchemaRef) -> Self {
        let mut next = self.clone();
        next.internals.refresh_id();
        next.rest = Some(schema.into_schema_ref());
        next
    }

    /// Positional schemas
    pub fn items(&self) -> &[SchemaRef] {
        &self.items
    }

    /// Number of trailing optional positions
    fn optional_tail(&self) -> usize {
        self.items
            .iter()
            .rev()
            .take_while(|s| s.internals().optional)
            .count()
    }
}

impl Schema for TupleSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, ctx: &mut ParseContext) {
        let Some(input) = take_sequence(payload, "tuple") else {
            return;
        };

        let len = input.len();
        let min = self.items.len() - self.optional_tail();
        let max = self.items.len();

        if len < min {
            payload.add_issue(
                RawIssue::new(IssueCode::TooSmall)
                    .with_input(Value::Array(input.clone()))
                    .with_property("minimum", min)
                    .with_property("inclusive", true)
                    .with_property("origin", "array"),
            );
            payload.value = Value::Array(input);
            return;
        }
        if self.rest.is_none() && len > max {
            payload.add_issue(
                RawIssue::new(IssueCode::TooBig)
                    .with_input(Value::Array(input.clone()))
                    .with_property("maximum", max)
                    .with_property("inclusive", true)
                    .with_property("origin", "array"),
            );
            payload.value = Value::Array(input);
            return;
        }

        let mut output = Vec::with_capacity(len);
        let mut input = input.into_iter();
        for (index, schema) in self.items.iter().enumerate() {
            match input.next() {
                Some(value) => {
                    output.push(parse_at(schema.as_ref(), value, PathSegment::Index(index), payload, ctx));
                }
                None => {
                    let parsed = parse_at(schema.as_ref(), Value::Nil, PathSegment::Index(index), payload, ctx);
                    if !parsed.is_nil() {
                        output.push(parsed);
                    }
                }
            }
        }
        if let Some(rest) = &self.rest {
            for (offset, value) in input.enumerate() {
                let index = self.items.len() + offset;
                output.push(parse_at(rest.as_ref(), value, PathSegment::Index(index), payload, ctx));
            }
        }

        payload.value = Value::Array(output);
    }
}

// =============================================================================
// Slice
// =============================================================================

/// Homogeneous sequence
#[derive(Debug, Clone)]
pub struct SliceSchema {
    internals: SchemaInternals,
    element: SchemaRef,
}

impl SliceSchema {
    /// Create a sequence schema
    pub fn new(element: impl IntoSchemaRef) -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Slice),
            element: element.into_schema_ref(),
        }
    }

    /// Element schema
    pub fn element(&self) -> &SchemaRef {
        &self.element
    }

    /// At least `n` elements
    pub fn min(&self, n: usize) -> Self {
        self.check(checks::min_length(n))
    }

    /// At most `n` elements
    pub fn max(&self, n: usize) -> Self {
        self.check(checks::max_length(n))
    }

    /// Exactly `n` elements
    pub fn length(&self, n: usize) -> Self {
        self.check(checks::length(n))
    }

    /// At least one element
    pub fn nonempty(&self) -> Self {
        self.min(1)
    }
}

impl Schema for SliceSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, ctx: &mut ParseContext) {
        let Some(input) = take_sequence(payload, "array") else {
            return;
        };
        let output = input
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                parse_at(self.element.as_ref(), value, PathSegment::Index(index), payload, ctx)
            })
            .collect();
        payload.value = Value::Array(output);
    }
}
