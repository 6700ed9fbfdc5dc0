//! Lazy, pipe and standalone transform schemas

use super::base::{schema_internals, Schema, SchemaRef};
use super::internals::{SchemaInternals, TransformFn, TypeCode};
use super::parsing::parse_schema;
use super::validation::{ParseContext, ParsePayload, RefinementContext};
use crate::error::Result;
use crate::value::Value;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Lazy
// =============================================================================

/// Producer of a deferred schema
pub type SchemaThunk = Arc<dyn Fn() -> SchemaRef + Send + Sync>;

/// Schema resolved on first use
///
/// Derived copies share the memoised inner schema.
#[derive(Clone)]
pub struct LazySchema {
    internals: SchemaInternals,
    getter: SchemaThunk,
    resolved: Arc<OnceCell<SchemaRef>>,
}

impl LazySchema {
    /// Create a lazy schema
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn() -> SchemaRef + Send + Sync + 'static,
    {
        Self {
            internals: SchemaInternals::new(TypeCode::Lazy),
            getter: Arc::new(getter),
            resolved: Arc::new(OnceCell::new()),
        }
    }

    /// The inner schema, produced on first call
    pub fn inner(&self) -> &SchemaRef {
        self.resolved.get_or_init(|| (self.getter)())
    }
}

impl fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySchema")
            .field("internals", &self.internals)
            .field("resolved", &self.resolved.get().is_some())
            .finish()
    }
}

impl Schema for LazySchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, ctx: &mut ParseContext) {
        parse_schema(self.inner().as_ref(), payload, ctx);
    }
}

// =============================================================================
// Pipe
// =============================================================================

/// Source schema feeding its output into a target schema
#[derive(Debug, Clone)]
pub struct PipeSchema {
    internals: SchemaInternals,
    source: SchemaRef,
    target: SchemaRef,
}

impl PipeSchema {
    /// Create a pipe
    pub fn new(source: SchemaRef, target: SchemaRef) -> Self {
        Self {
            internals: SchemaInternals::new(TypeCode::Pipe),
            source,
            target,
        }
    }

    /// Schema applied first
    pub fn source(&self) -> &SchemaRef {
        &self.source
    }

    /// Schema applied to the source's output
    pub fn target(&self) -> &SchemaRef {
        &self.target
    }
}

impl Schema for PipeSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, ctx: &mut ParseContext) {
        let start = payload.issues.len();
        parse_schema(self.source.as_ref(), payload, ctx);
        if payload.has_issues_since(start) || payload.short_circuited {
            return;
        }
        parse_schema(self.target.as_ref(), payload, ctx);
    }
}

// =============================================================================
// Transform
// =============================================================================

/// Schema that only maps its input
///
/// Accepts any value, nil included, and hands it to the transform.
#[derive(Debug, Clone)]
pub struct TransformSchema {
    internals: SchemaInternals,
}

impl TransformSchema {
    /// Create a standalone transform
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &mut RefinementContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        let mut internals = SchemaInternals::new(TypeCode::Transform);
        internals.transform = Some(TransformFn::new(f));
        Self { internals }
    }
}

impl Schema for TransformSchema {
    schema_internals!();

    fn parse_value(&self, _payload: &mut ParsePayload, _ctx: &mut ParseContext) {}
}
