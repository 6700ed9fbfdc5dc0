//! # shapeguard
//!
//! Declarative, composable schema validation and parsing for dynamic values.
//!
//! A schema describes the expected shape of a [`Value`]. Parsing checks the
//! value against the schema, applies coercions, defaults and transforms, and
//! returns either the parsed value or a [`ValidationError`] listing every
//! issue with its path.
//!
//! ## Features
//!
//! - Leaf schemas for strings, numbers, booleans, times, literals and enums
//! - Objects, records, tuples, arrays, unions, intersections, lazy and pipes
//! - Optional / nilable / default / prefault modifiers with a fixed priority
//! - Refinements, overwrites and transforms
//! - Error maps at the check, schema, call and global level
//! - Pointer values validated in place with cycle detection
//!
//! ## Example
//!
//! ```rust
//! use shapeguard::{int, object, string, SchemaExt, Value};
//! use serde_json::json;
//!
//! let user = object()
//!     .field("name", string().min(2))
//!     .field("age", int().min(18).max(120));
//!
//! let ok = user.parse(Value::from(json!({"name": "Ada", "age": 36})));
//! assert!(ok.is_ok());
//!
//! let err = user
//!     .parse(Value::from(json!({"name": "A", "age": 15})))
//!     .unwrap_err();
//! assert_eq!(err.issues.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod value;

// Issues and messages
pub mod config;
pub mod format;
pub mod issues;
pub mod locales;
pub mod registry;

// Schemas and the engine
pub mod validators;

// Re-exports for convenience
pub use config::{config, set_config, Config};
pub use error::{Error, Result, ValidationError};
pub use format::{flatten, format_path, prettify, FlattenedError};
pub use issues::{ErrorMap, FinalizedIssue, IssueCode, PathSegment, RawIssue};
pub use limits::Limits;
pub use registry::Metadata;
pub use validators::checks::RefineParams;
pub use validators::{
    AnySchema, BoolSchema, CustomSchema, DiscriminatedUnionSchema, EnumSchema, FloatSchema,
    IntSchema, IntersectionSchema, IntoSchemaRef, LazySchema, LiteralSchema, NeverSchema,
    NilSchema, ObjectSchema, OptionalityMode, ParseContext, PipeSchema, RecordSchema,
    RefinementContext, Schema, SchemaExt, SchemaRef, SliceSchema, StringSchema, TimeSchema,
    TransformSchema, TupleSchema, UnionSchema, UnknownKeys,
};
pub use value::{FromValue, Pointer, Value};

use validators::helpers::{EMAIL_REGEX, IPV4_REGEX, UUID_REGEX};

/// Version of the shapeguard library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Leaf constructors
// =============================================================================

/// String schema
pub fn string() -> StringSchema {
    StringSchema::new()
}

/// Integer schema
pub fn int() -> IntSchema {
    IntSchema::new()
}

/// Floating point schema; integers are accepted and widened
pub fn float() -> FloatSchema {
    FloatSchema::new()
}

/// Boolean schema
pub fn boolean() -> BoolSchema {
    BoolSchema::new()
}

/// Timestamp schema
pub fn time() -> TimeSchema {
    TimeSchema::new()
}

/// Schema accepting only nil
pub fn nil() -> NilSchema {
    NilSchema::new()
}

/// Schema accepting anything
pub fn any() -> AnySchema {
    AnySchema::any()
}

/// Schema accepting anything, to be narrowed later
pub fn unknown() -> AnySchema {
    AnySchema::unknown()
}

/// Schema accepting nothing
pub fn never() -> NeverSchema {
    NeverSchema::new()
}

/// Exactly `value`
pub fn literal(value: impl Into<Value>) -> LiteralSchema {
    LiteralSchema::new(value)
}

/// One of `values`; fails on an empty set
pub fn enumeration<I, V>(values: I) -> Result<EnumSchema>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    EnumSchema::new(values)
}

/// Email address string
pub fn email() -> StringSchema {
    StringSchema::with_format("email", EMAIL_REGEX.clone())
}

/// Hyphenated UUID string
pub fn uuid() -> StringSchema {
    StringSchema::with_format("uuid", UUID_REGEX.clone())
}

/// Absolute URL string
pub fn url() -> StringSchema {
    StringSchema::new().url()
}

/// Dotted-quad IPv4 string
pub fn ipv4() -> StringSchema {
    StringSchema::with_format("ipv4", IPV4_REGEX.clone())
}

/// Value accepted by `predicate`
pub fn custom<F>(predicate: F) -> CustomSchema
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    CustomSchema::new(predicate)
}

/// Standalone mapping of any input
pub fn transform<F>(f: F) -> TransformSchema
where
    F: Fn(Value, &mut RefinementContext<'_>) -> Result<Value> + Send + Sync + 'static,
{
    TransformSchema::new(f)
}

// =============================================================================
// Composite constructors
// =============================================================================

/// Object with no fields yet
pub fn object() -> ObjectSchema {
    ObjectSchema::new()
}

/// Map with uniform keys and values
pub fn record(key: impl IntoSchemaRef, value: impl IntoSchemaRef) -> RecordSchema {
    RecordSchema::new(key, value)
}

/// Homogeneous sequence
pub fn array<S: IntoSchemaRef>(element: S) -> SliceSchema {
    SliceSchema::new(element)
}

/// Fixed-position sequence
pub fn tuple(items: Vec<SchemaRef>) -> TupleSchema {
    TupleSchema::new(items)
}

/// First matching alternative
pub fn union(options: Vec<SchemaRef>) -> UnionSchema {
    UnionSchema::new(options)
}

/// Alternative selected by the literal value at `key`
pub fn discriminated_union(
    key: impl Into<String>,
    options: Vec<SchemaRef>,
) -> Result<DiscriminatedUnionSchema> {
    DiscriminatedUnionSchema::new(key, options)
}

/// Value satisfying both schemas, results merged
pub fn intersection(left: impl IntoSchemaRef, right: impl IntoSchemaRef) -> IntersectionSchema {
    IntersectionSchema::new(left.into_schema_ref(), right.into_schema_ref())
}

/// Schema produced on first use
pub fn lazy<F>(getter: F) -> LazySchema
where
    F: Fn() -> SchemaRef + Send + Sync + 'static,
{
    LazySchema::new(getter)
}

/// `target` applied to the output of `source`
pub fn pipe(source: impl IntoSchemaRef, target: impl IntoSchemaRef) -> PipeSchema {
    PipeSchema::new(source.into_schema_ref(), target.into_schema_ref())
}
