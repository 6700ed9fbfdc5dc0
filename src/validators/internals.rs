//! Schema internals
//!
//! The state backing every schema. Modifier methods never mutate a schema in
//! place: they clone it, give the clone a fresh identity, and edit the clone's
//! internals.

use super::checks::Check;
use super::validation::RefinementContext;
use crate::error::Result;
use crate::issues::ErrorMap;
use crate::value::Value;
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// =============================================================================
// Identity
// =============================================================================

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a schema value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u64);

impl SchemaId {
    /// Allocate a new identity
    pub fn next() -> Self {
        SchemaId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Type codes
// =============================================================================

/// Kind of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    /// UTF-8 string
    String,
    /// Signed integer
    Integer,
    /// Floating point number
    Float,
    /// Boolean
    Bool,
    /// Timestamp
    Time,
    /// The nil value itself
    Nil,
    /// Any value
    Any,
    /// Any value, to be narrowed later
    Unknown,
    /// No value
    Never,
    /// One literal value
    Literal,
    /// One of several literal values
    Enum,
    /// Fixed-position tuple
    Array,
    /// Homogeneous sequence
    Slice,
    /// Object with a declared shape
    Object,
    /// String-keyed map with uniform values
    Record,
    /// First matching alternative
    Union,
    /// Alternative selected by a discriminator key
    DiscriminatedUnion,
    /// Value satisfying every component
    Intersection,
    /// Deferred schema
    Lazy,
    /// Source schema feeding a target schema
    Pipe,
    /// Standalone value mapping
    Transform,
    /// User predicate
    Custom,
}

impl TypeCode {
    /// Get the type code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeCode::String => "string",
            TypeCode::Integer => "integer",
            TypeCode::Float => "float",
            TypeCode::Bool => "boolean",
            TypeCode::Time => "time",
            TypeCode::Nil => "nil",
            TypeCode::Any => "any",
            TypeCode::Unknown => "unknown",
            TypeCode::Never => "never",
            TypeCode::Literal => "literal",
            TypeCode::Enum => "enum",
            TypeCode::Array => "array",
            TypeCode::Slice => "slice",
            TypeCode::Object => "object",
            TypeCode::Record => "record",
            TypeCode::Union => "union",
            TypeCode::DiscriminatedUnion => "discriminated_union",
            TypeCode::Intersection => "intersection",
            TypeCode::Lazy => "lazy",
            TypeCode::Pipe => "pipe",
            TypeCode::Transform => "transform",
            TypeCode::Custom => "custom",
        }
    }

    /// Kinds that accept nil outright
    pub fn accepts_nil(&self) -> bool {
        matches!(self, TypeCode::Any | TypeCode::Unknown | TypeCode::Nil)
    }

    /// Wrapper kinds that hand nil input to their inner schemas
    pub fn delegates_nil(&self) -> bool {
        matches!(
            self,
            TypeCode::Union
                | TypeCode::Intersection
                | TypeCode::Lazy
                | TypeCode::Pipe
                | TypeCode::Transform
                | TypeCode::Custom
        )
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Modifiers
// =============================================================================

/// Modifier families affecting nil handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierFamily {
    /// `optional`
    Optional,
    /// `nilable`
    Nilable,
    /// `non_optional`
    NonOptional,
    /// `default` / `default_fn`
    Default,
    /// `prefault` / `prefault_fn`
    Prefault,
}

/// Producer of a substitute value
pub type ValueFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Substitute for nil input, as a value or a function
#[derive(Clone)]
pub enum Fallback {
    /// Fixed value, deep-cloned on each use
    Value(Value),
    /// Function called on each use
    Func(ValueFn),
}

impl Fallback {
    /// Produce a fresh substitute
    pub fn resolve(&self) -> Value {
        match self {
            Fallback::Value(value) => value.deep_clone(),
            Fallback::Func(f) => f(),
        }
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::Value(value) => write!(f, "Value({})", value),
            Fallback::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// Post-validation value mapping
#[derive(Clone)]
pub struct TransformFn(
    Arc<dyn Fn(Value, &mut RefinementContext<'_>) -> Result<Value> + Send + Sync>,
);

impl TransformFn {
    /// Wrap a transform function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &mut RefinementContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Apply the transform
    pub fn apply(&self, value: Value, ctx: &mut RefinementContext<'_>) -> Result<Value> {
        (self.0)(value, ctx)
    }
}

impl fmt::Debug for TransformFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransformFn(..)")
    }
}

/// Which side of a schema optionality is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalityMode {
    /// May the input be absent?
    Input,
    /// May the output be absent?
    Output,
}

// =============================================================================
// Internals
// =============================================================================

/// Backing state of every schema
#[derive(Debug, Clone)]
pub struct SchemaInternals {
    /// Identity, refreshed whenever a modifier derives a new schema
    pub id: SchemaId,
    /// Shared by every copy carrying `id`; registries hold it weakly
    pub(crate) liveness: Arc<()>,
    /// Kind of the schema
    pub type_code: TypeCode,
    /// Checks in insertion order
    pub checks: Vec<Check>,
    /// Attempt leaf coercion before failing a type check
    pub coerce: bool,
    /// Accept nil
    pub optional: bool,
    /// Accept nil as a value
    pub nilable: bool,
    /// Reject nil even if otherwise permitted
    pub non_optional: bool,
    /// Key may be absent but explicit nil is rejected
    pub exact_optional: bool,
    /// Short-circuit substitute for nil
    pub default: Option<Fallback>,
    /// Preprocessing substitute for nil
    pub prefault: Option<Fallback>,
    /// Most recently installed nil-handling modifier
    pub last_modifier: Option<ModifierFamily>,
    /// Post-validation mapping
    pub transform: Option<TransformFn>,
    /// Permitted literal values
    pub values: Vec<Value>,
    /// Pattern the string form must match
    pub pattern: Option<Regex>,
    /// Schema-local error map
    pub error_map: Option<ErrorMap>,
    /// Leaf-specific configuration
    pub bag: IndexMap<String, Value>,
}

impl SchemaInternals {
    /// Fresh internals for a kind
    pub fn new(type_code: TypeCode) -> Self {
        Self {
            id: SchemaId::next(),
            liveness: Arc::new(()),
            type_code,
            checks: Vec::new(),
            coerce: false,
            optional: false,
            nilable: false,
            non_optional: false,
            exact_optional: false,
            default: None,
            prefault: None,
            last_modifier: None,
            transform: None,
            values: Vec::new(),
            pattern: None,
            error_map: None,
            bag: IndexMap::new(),
        }
    }

    /// Give these internals a new identity
    pub fn refresh_id(&mut self) {
        self.id = SchemaId::next();
        self.liveness = Arc::new(());
    }

    /// Whether a default is installed
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Whether a prefault is installed
    pub fn has_prefault(&self) -> bool {
        self.prefault.is_some()
    }

    /// Whether nil/absent is permitted on the given side
    ///
    /// On input, substitutes make absence acceptable. On output, a default or
    /// prefault produces a value unless `optional`/`nilable` was installed
    /// after it.
    pub fn is_optional(&self, mode: OptionalityMode) -> bool {
        if self.non_optional && !self.has_default() && !self.has_prefault() {
            return false;
        }
        match mode {
            OptionalityMode::Input => {
                self.optional || self.nilable || self.has_default() || self.has_prefault()
            }
            OptionalityMode::Output => {
                let accepts_last = matches!(
                    self.last_modifier,
                    Some(ModifierFamily::Optional) | Some(ModifierFamily::Nilable)
                );
                (self.optional || self.nilable)
                    && (accepts_last || (!self.has_default() && !self.has_prefault()))
            }
        }
    }

    pub(crate) fn set_optional(&mut self) {
        self.optional = true;
        self.non_optional = false;
        self.last_modifier = Some(ModifierFamily::Optional);
    }

    pub(crate) fn set_nilable(&mut self) {
        self.nilable = true;
        self.non_optional = false;
        self.last_modifier = Some(ModifierFamily::Nilable);
    }

    pub(crate) fn set_non_optional(&mut self) {
        self.non_optional = true;
        self.optional = false;
        self.nilable = false;
        self.exact_optional = false;
        self.last_modifier = Some(ModifierFamily::NonOptional);
    }

    pub(crate) fn set_default(&mut self, fallback: Fallback) {
        self.default = Some(fallback);
        self.last_modifier = Some(ModifierFamily::Default);
    }

    pub(crate) fn set_prefault(&mut self, fallback: Fallback) {
        self.prefault = Some(fallback);
        self.last_modifier = Some(ModifierFamily::Prefault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = SchemaInternals::new(TypeCode::String);
        let mut b = a.clone();
        assert_eq!(a.id, b.id);
        b.refresh_id();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_optionality_modes() {
        let mut internals = SchemaInternals::new(TypeCode::String);
        assert!(!internals.is_optional(OptionalityMode::Input));

        internals.set_optional();
        assert!(internals.is_optional(OptionalityMode::Input));
        assert!(internals.is_optional(OptionalityMode::Output));

        internals.set_default(Fallback::Value(Value::from("x")));
        assert!(internals.is_optional(OptionalityMode::Input));
        assert!(!internals.is_optional(OptionalityMode::Output));
    }

    #[test]
    fn test_output_optionality_follows_install_order() {
        let mut internals = SchemaInternals::new(TypeCode::String);
        internals.set_default(Fallback::Value(Value::from("x")));
        internals.set_optional();
        assert!(internals.is_optional(OptionalityMode::Output));

        internals.set_prefault(Fallback::Value(Value::from("y")));
        assert!(!internals.is_optional(OptionalityMode::Output));
        assert!(internals.is_optional(OptionalityMode::Input));
    }

    #[test]
    fn test_non_optional_clears_optional() {
        let mut internals = SchemaInternals::new(TypeCode::Integer);
        internals.set_optional();
        internals.set_non_optional();
        assert!(!internals.optional);
        assert_eq!(internals.last_modifier, Some(ModifierFamily::NonOptional));
        assert!(!internals.is_optional(OptionalityMode::Input));
    }

    #[test]
    fn test_fallback_value_is_deep_cloned() {
        let fallback = Fallback::Value(Value::from(vec![1i64, 2]));
        let mut first = fallback.resolve();
        if let Value::Array(items) = &mut first {
            items.push(Value::Int(3));
        }
        assert_eq!(fallback.resolve(), Value::from(vec![1i64, 2]));
    }

    #[test]
    fn test_type_code_nil_behaviour() {
        assert!(TypeCode::Unknown.accepts_nil());
        assert!(!TypeCode::String.accepts_nil());
        assert!(TypeCode::Union.delegates_nil());
        assert!(!TypeCode::Object.delegates_nil());
        assert_eq!(TypeCode::DiscriminatedUnion.to_string(), "discriminated_union");
    }
}
