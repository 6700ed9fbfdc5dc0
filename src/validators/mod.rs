//! Schema validators
//!
//! Schemas, the checks attached to them and the engine that runs a value
//! through them.

// Engine
pub mod base;
pub mod checks;
pub mod helpers;
pub mod internals;
mod modifiers;
pub mod parsing;
pub mod validation;

// Schema kinds
pub mod builtins;
pub mod collections;
pub mod combinators;
pub mod complex_types;
pub mod literals;
pub mod unions;

// Re-exports
pub use base::{IntoSchemaRef, Schema, SchemaExt, SchemaRef};
pub use builtins::{
    AnySchema, BoolSchema, FloatSchema, IntSchema, NeverSchema, NilSchema, StringSchema,
    TimeSchema,
};
pub use checks::{Check, CheckKind, RefineParams};
pub use collections::{SliceSchema, TupleSchema};
pub use combinators::{LazySchema, PipeSchema, TransformSchema};
pub use complex_types::{ObjectSchema, RecordSchema, UnknownKeys};
pub use internals::{Fallback, OptionalityMode, SchemaId, SchemaInternals, TypeCode};
pub use literals::{CustomSchema, EnumSchema, LiteralSchema};
pub use unions::{DiscriminatedUnionSchema, IntersectionSchema, UnionSchema};
pub use validation::{ParseContext, ParsePayload, RefinementContext};
