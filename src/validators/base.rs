//! Base schema infrastructure
//!
//! Every schema kind implements [`Schema`]: it owns a [`SchemaInternals`] and
//! knows how to validate a non-nil value of its kind. Everything common to all
//! kinds (modifiers, checks, transforms, parsing entry points) lives on
//! [`SchemaExt`], which is implemented for every concrete schema.

use super::checks::{self, Check, RefineParams};
use super::combinators::PipeSchema;
use super::internals::{Fallback, SchemaId, SchemaInternals, TransformFn, TypeCode};
use super::parsing;
use super::validation::{ParseContext, ParsePayload, RefinementContext};
use crate::error::{Error, Result, ValidationError};
use crate::issues::{ErrorMap, RawIssue};
use crate::registry::{self, Metadata};
use crate::value::{FromValue, Value};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a schema of any kind
pub type SchemaRef = Arc<dyn Schema>;

/// Base trait for all schemas
pub trait Schema: fmt::Debug + Send + Sync {
    /// Backing state
    fn internals(&self) -> &SchemaInternals;

    /// Mutable backing state; only used on freshly derived copies
    fn internals_mut(&mut self) -> &mut SchemaInternals;

    /// Copy this schema into a new box
    fn clone_schema(&self) -> Box<dyn Schema>;

    /// Validate a non-nil value of this kind
    ///
    /// Issues are added to the payload; the payload value may be replaced.
    /// Checks, literal values, the pattern and the transform are applied by
    /// the engine afterwards.
    fn parse_value(&self, payload: &mut ParsePayload, ctx: &mut ParseContext);

    /// Leaf-specific conversion, consulted only when `coerce` is set
    fn coerce_value(&self, _value: &Value) -> Option<Value> {
        None
    }

    /// Declared fields, for object kinds
    fn shape(&self) -> Option<&IndexMap<String, SchemaRef>> {
        None
    }

    /// Kind of the schema
    fn type_code(&self) -> TypeCode {
        self.internals().type_code
    }

    /// Identity of the schema
    fn id(&self) -> SchemaId {
        self.internals().id
    }
}

impl dyn Schema {
    /// Parse a value against this schema
    pub fn parse(&self, input: impl Into<Value>) -> std::result::Result<Value, ValidationError> {
        parsing::parse_root(self, input.into(), ParseContext::new())
    }

    /// Parse with an explicit context
    pub fn parse_with(
        &self,
        input: impl Into<Value>,
        ctx: ParseContext,
    ) -> std::result::Result<Value, ValidationError> {
        parsing::parse_root(self, input.into(), ctx)
    }
}

/// Conversion into a [`SchemaRef`]
pub trait IntoSchemaRef {
    /// Wrap into a shared handle
    fn into_schema_ref(self) -> SchemaRef;
}

impl<S: Schema + 'static> IntoSchemaRef for S {
    fn into_schema_ref(self) -> SchemaRef {
        Arc::new(self)
    }
}

impl IntoSchemaRef for SchemaRef {
    fn into_schema_ref(self) -> SchemaRef {
        self
    }
}

/// Accessors shared by every schema struct with an `internals` field
macro_rules! schema_internals {
    () => {
        fn internals(&self) -> &$crate::validators::internals::SchemaInternals {
            &self.internals
        }

        fn internals_mut(&mut self) -> &mut $crate::validators::internals::SchemaInternals {
            &mut self.internals
        }

        fn clone_schema(&self) -> Box<dyn $crate::validators::base::Schema> {
            Box::new(self.clone())
        }
    };
}

pub(crate) use schema_internals;

/// Accept the payload value if `accepts` holds, possibly after coercion
pub(crate) fn accept_leaf<F>(schema: &dyn Schema, payload: &mut ParsePayload, accepts: F)
where
    F: Fn(&Value) -> bool,
{
    if accepts(&payload.value) {
        return;
    }
    if schema.internals().coerce {
        if let Some(coerced) = schema.coerce_value(&payload.value) {
            if accepts(&coerced) {
                payload.value = coerced;
                return;
            }
        }
    }
    let issue = RawIssue::invalid_type(schema.type_code().as_str(), &payload.value);
    payload.add_issue(issue);
}

/// Copy a shared schema with a fresh identity and edited internals
pub(crate) fn derive_ref<F>(schema: &SchemaRef, edit: F) -> SchemaRef
where
    F: FnOnce(&mut SchemaInternals),
{
    let mut next = schema.clone_schema();
    let internals = next.internals_mut();
    internals.refresh_id();
    edit(internals);
    Arc::from(next)
}

// =============================================================================
// Modifiers and parsing
// =============================================================================

/// Modifiers, checks and parse entry points shared by every schema
///
/// Every modifier returns a new schema with a fresh identity; the receiver is
/// never changed.
pub trait SchemaExt: Schema + Clone + Sized + 'static {
    /// Clone with a fresh identity and apply `edit` to the copy
    fn derive<F>(&self, edit: F) -> Self
    where
        F: FnOnce(&mut SchemaInternals),
    {
        let mut next = self.clone();
        next.internals_mut().refresh_id();
        edit(next.internals_mut());
        next
    }

    /// Wrap into a shared handle
    fn into_ref(self) -> SchemaRef {
        Arc::new(self)
    }

    /// Accept nil
    fn optional(&self) -> Self {
        self.derive(|i| i.set_optional())
    }

    /// Accept nil as a value
    fn nilable(&self) -> Self {
        self.derive(|i| i.set_nilable())
    }

    /// Both optional and nilable
    fn nullish(&self) -> Self {
        self.derive(|i| {
            i.set_optional();
            i.set_nilable();
        })
    }

    /// Reject nil even if otherwise permitted
    fn non_optional(&self) -> Self {
        self.derive(|i| i.set_non_optional())
    }

    /// As an object field: may be absent, but an explicit nil is rejected
    fn exact_optional(&self) -> Self {
        self.derive(|i| {
            i.set_optional();
            i.exact_optional = true;
        })
    }

    /// Substitute `value` for nil and skip all further processing
    fn default(&self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.derive(|i| i.set_default(Fallback::Value(value)))
    }

    /// Substitute the result of `f` for nil and skip all further processing
    fn default_fn<F>(&self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.derive(|i| i.set_default(Fallback::Func(Arc::new(f))))
    }

    /// Substitute `value` for nil and parse it normally
    fn prefault(&self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.derive(|i| i.set_prefault(Fallback::Value(value)))
    }

    /// Substitute the result of `f` for nil and parse it normally
    fn prefault_fn<F>(&self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.derive(|i| i.set_prefault(Fallback::Func(Arc::new(f))))
    }

    /// Attempt leaf coercion before failing a type check
    fn coerce(&self) -> Self {
        self.derive(|i| i.coerce = true)
    }

    /// Use `error` for issues produced by this schema
    fn error(&self, error: impl Into<ErrorMap>) -> Self {
        let error = error.into();
        self.derive(|i| i.error_map = Some(error))
    }

    /// Append a check and fire its attach hooks
    fn check(&self, check: Check) -> Self {
        self.derive(|i| {
            check.attach(i);
            i.checks.push(check);
        })
    }

    /// Add a predicate; `false` reports a `custom` issue
    fn refine<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.check(checks::refine(predicate, RefineParams::new()))
    }

    /// Add a predicate with message, path, abort and gating options
    fn refine_with<F>(&self, predicate: F, params: RefineParams) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.check(checks::refine(predicate, params))
    }

    /// Add a check that reports its own issues through the context
    fn super_refine<F>(&self, f: F) -> Self
    where
        F: Fn(&Value, &mut RefinementContext<'_>) + Send + Sync + 'static,
    {
        self.check(checks::custom(f))
    }

    /// Replace the value after validation; also applied to defaults
    fn overwrite<F>(&self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.check(checks::overwrite(f))
    }

    /// Map the validated value; chained transforms compose in order
    fn transform<F>(&self, f: F) -> Self
    where
        F: Fn(Value, &mut RefinementContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.derive(|i| {
            let next = match i.transform.take() {
                None => TransformFn::new(f),
                Some(previous) => TransformFn::new(move |value, ctx| {
                    let value = previous.apply(value, ctx)?;
                    f(value, ctx)
                }),
            };
            i.transform = Some(next);
        })
    }

    /// Feed the validated value into `target`
    fn pipe<T: IntoSchemaRef>(&self, target: T) -> PipeSchema {
        PipeSchema::new(self.clone().into_ref(), target.into_schema_ref())
    }

    /// Register metadata for a derived copy of this schema
    fn meta(&self, metadata: Metadata) -> Self {
        let next = self.derive(|_| {});
        registry::global().add(&next, metadata);
        next
    }

    /// Register a description, keeping any metadata already registered
    fn describe(&self, description: impl Into<String>) -> Self {
        let metadata = registry::global()
            .get(self)
            .unwrap_or_default()
            .with_description(description);
        self.meta(metadata)
    }

    /// Registered metadata, if any
    fn metadata(&self) -> Option<Metadata> {
        registry::global().get(self)
    }

    /// Parse a value
    fn parse(&self, input: impl Into<Value>) -> std::result::Result<Value, ValidationError> {
        parsing::parse_root(self, input.into(), ParseContext::new())
    }

    /// Parse with an explicit context
    fn parse_with(
        &self,
        input: impl Into<Value>,
        ctx: ParseContext,
    ) -> std::result::Result<Value, ValidationError> {
        parsing::parse_root(self, input.into(), ctx)
    }

    /// Parse and extract a typed result
    fn parse_as<T: FromValue>(&self, input: impl Into<Value>) -> Result<T> {
        let value = self.parse(input)?;
        parsing::extract(value).map_err(Error::Validation)
    }

    /// Parse, panicking on failure
    fn must_parse(&self, input: impl Into<Value>) -> Value {
        self.must_parse_with(input, ParseContext::new())
    }

    /// Parse with an explicit context, panicking on failure
    fn must_parse_with(&self, input: impl Into<Value>, ctx: ParseContext) -> Value {
        match self.parse_with(input, ctx) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }

    /// Whether nil input would be accepted without an issue
    fn is_optional(&self) -> bool {
        self.internals()
            .is_optional(super::internals::OptionalityMode::Input)
    }
}

impl<T: Schema + Clone + 'static> SchemaExt for T {}
