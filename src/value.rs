//! Dynamic input values
//!
//! Every schema consumes and produces a [`Value`]: a tagged variant of
//! primitives, sequences, ordered mappings and shared pointers.

use chrono::{DateTime, FixedOffset, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A dynamically typed value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent / null value
    #[default]
    Nil,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Timestamp with offset
    Time(DateTime<FixedOffset>),
    /// Ordered sequence
    Array(Vec<Value>),
    /// Insertion-ordered string-keyed mapping
    Object(IndexMap<String, Value>),
    /// Shared, mutable reference to another value
    Pointer(Pointer),
}

impl Value {
    /// Check whether the value is nil, or a pointer chain ending in nil
    pub fn is_nil(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Pointer(p) => p.resolve().is_nil(),
            _ => false,
        }
    }

    /// Name of the value's type as reported in `received`
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Time(_) => "time",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Pointer(p) => p.resolve().type_name(),
        }
    }

    /// Borrow as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as an array
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as an object
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key on an object value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Borrow as a pointer
    pub fn as_pointer(&self) -> Option<&Pointer> {
        match self {
            Value::Pointer(p) => Some(p),
            _ => None,
        }
    }

    /// Size used by length checks: characters, elements or keys
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            Value::Object(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Copy the value, allocating fresh cells for every pointer
    ///
    /// Cells shared within the value stay shared in the copy, cycles included.
    pub fn deep_clone(&self) -> Value {
        self.deep_clone_with(&mut HashMap::new())
    }

    fn deep_clone_with(&self, cells: &mut HashMap<usize, Pointer>) -> Value {
        match self {
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| v.deep_clone_with(cells)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone_with(cells)))
                    .collect(),
            ),
            Value::Pointer(p) => {
                if let Some(copy) = cells.get(&p.address()) {
                    return Value::Pointer(copy.clone());
                }
                let copy = Pointer::new(Value::Nil);
                cells.insert(p.address(), copy.clone());
                copy.set(p.get().deep_clone_with(cells));
                Value::Pointer(copy)
            }
            other => other.clone(),
        }
    }

    /// Convert to a JSON value
    ///
    /// A pointer reached again through itself renders as `"[Circular]"`.
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_with(&mut HashSet::new())
    }

    fn to_json_with(&self, open: &mut HashSet<usize>) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Time(t) => serde_json::Value::String(t.to_rfc3339()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json_with(open)).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_with(open)))
                    .collect(),
            ),
            Value::Pointer(p) => {
                if !open.insert(p.address()) {
                    return serde_json::Value::String(CIRCULAR.to_string());
                }
                let json = p.get().to_json_with(open);
                open.remove(&p.address());
                json
            }
        }
    }

    // Pairs of cells already being compared count as equal.
    fn eq_with(&self, other: &Value, open: &mut HashSet<(usize, usize)>) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_with(y, open))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, x)| b.get(k).map_or(false, |y| x.eq_with(y, open)))
            }
            (Value::Pointer(a), Value::Pointer(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let pair = (a.address(), b.address());
                if !open.insert(pair) {
                    return true;
                }
                let equal = a.get().eq_with(&b.get(), open);
                open.remove(&pair);
                equal
            }
            _ => false,
        }
    }
}

/// Rendering of a pointer that leads back to itself
pub const CIRCULAR: &str = "[Circular]";

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.eq_with(other, &mut HashSet::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// =============================================================================
// Pointer
// =============================================================================

/// Shared, interior-mutable cell with identity
///
/// Cloning a pointer yields another handle to the same cell.
#[derive(Clone, Default)]
pub struct Pointer(Arc<RwLock<Value>>);

impl Pointer {
    /// Allocate a new cell holding `value`
    pub fn new(value: impl Into<Value>) -> Self {
        Self(Arc::new(RwLock::new(value.into())))
    }

    /// Copy of the pointee
    pub fn get(&self) -> Value {
        self.0.read().clone()
    }

    /// Replace the pointee in place
    pub fn set(&self, value: Value) {
        *self.0.write() = value;
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Pointer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the cell, stable for the pointer's lifetime
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Last pointer of a pointer chain. Stops at the first repeated cell.
    pub fn innermost(&self) -> Pointer {
        let mut seen = vec![self.address()];
        let mut current = self.clone();
        loop {
            let next = match &*current.0.read() {
                Value::Pointer(next) => Some(next.clone()),
                _ => None,
            };
            let next = match next {
                Some(next) => next,
                None => return current,
            };
            if seen.contains(&next.address()) {
                return current;
            }
            seen.push(next.address());
            current = next;
        }
    }

    /// Pointee of the innermost pointer of the chain
    pub fn resolve(&self) -> Value {
        match self.innermost().get() {
            // only reachable for cyclic chains
            Value::Pointer(_) => Value::Nil,
            value => value,
        }
    }
}

impl fmt::Debug for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pointer({:#x})", self.address())
    }
}

// =============================================================================
// Conversions into Value
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::Time(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v.fixed_offset())
    }
}

impl From<Pointer> for Value {
    fn from(v: Pointer) -> Self {
        Value::Pointer(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<IndexMap<String, T>> for Value {
    fn from(v: IndexMap<String, T>) -> Self {
        Value::Object(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

// =============================================================================
// Typed extraction
// =============================================================================

/// Typed extraction from a parsed [`Value`]
pub trait FromValue: Sized {
    /// Name used as `expected` when extraction fails
    fn type_name() -> &'static str;

    /// Convert, or return `None` if the value has the wrong shape
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    fn type_name() -> &'static str {
        "any"
    }

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for String {
    fn type_name() -> &'static str {
        "string"
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            Value::Pointer(p) => Self::from_value(p.resolve()),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn type_name() -> &'static str {
        "integer"
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(i),
            Value::Pointer(p) => Self::from_value(p.resolve()),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn type_name() -> &'static str {
        "float"
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Pointer(p) => Self::from_value(p.resolve()),
            other => other.as_f64(),
        }
    }
}

impl FromValue for bool {
    fn type_name() -> &'static str {
        "bool"
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            Value::Pointer(p) => Self::from_value(p.resolve()),
            _ => None,
        }
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn type_name() -> &'static str {
        "time"
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Time(t) => Some(t),
            Value::Pointer(p) => Self::from_value(p.resolve()),
            _ => None,
        }
    }
}

impl FromValue for Pointer {
    fn type_name() -> &'static str {
        "pointer"
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Pointer(p) => Some(p),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn type_name() -> &'static str {
        T::type_name()
    }

    fn from_value(value: Value) -> Option<Self> {
        if value.is_nil() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn type_name() -> &'static str {
        "array"
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            Value::Pointer(p) => Self::from_value(p.resolve()),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    fn type_name() -> &'static str {
        "object"
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            Value::Pointer(p) => Self::from_value(p.resolve()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from(json!(42)), Value::Int(42));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
        assert!(matches!(Value::from(json!({"a": [1, null]})), Value::Object(_)));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Nil.type_name(), "nil");
        assert_eq!(Value::Int(1).type_name(), "number");
        assert_eq!(Value::Float(1.0).type_name(), "number");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::Pointer(Pointer::new("x")).type_name(), "string");
    }

    #[test]
    fn test_nil_pointer_is_nil() {
        let inner = Pointer::new(Value::Nil);
        let outer = Pointer::new(Value::Pointer(inner));
        assert!(Value::Pointer(outer).is_nil());
        assert!(!Value::Pointer(Pointer::new(0)).is_nil());
    }

    #[test]
    fn test_pointer_identity_and_set() {
        let p = Pointer::new("a");
        let q = p.clone();
        q.set(Value::from("b"));
        assert!(p.ptr_eq(&q));
        assert_eq!(p.get(), Value::from("b"));
        assert!(!p.ptr_eq(&Pointer::new("b")));
    }

    #[test]
    fn test_cyclic_pointer_resolves_without_looping() {
        let p = Pointer::new(Value::Nil);
        p.set(Value::Pointer(p.clone()));
        assert_eq!(p.resolve(), Value::Nil);
    }

    #[test]
    fn test_deep_clone_detaches_pointers() {
        let p = Pointer::new(1);
        let original = Value::Array(vec![Value::Pointer(p.clone())]);
        let copy = original.deep_clone();
        p.set(Value::Int(2));
        match copy {
            Value::Array(items) => assert_eq!(items[0], Value::Pointer(Pointer::new(1))),
            _ => panic!("expected array"),
        }
    }

    fn cyclic_node() -> Pointer {
        let node = Pointer::new(Value::Nil);
        let mut fields = IndexMap::new();
        fields.insert("name".to_string(), Value::from("a"));
        fields.insert("next".to_string(), Value::Pointer(node.clone()));
        node.set(Value::Object(fields));
        node
    }

    #[test]
    fn test_cyclic_value_renders_placeholder() {
        let value = Value::Pointer(cyclic_node());
        assert_eq!(value.to_json(), json!({"name": "a", "next": "[Circular]"}));
        assert_eq!(value.to_string(), r#"{"name":"a","next":"[Circular]"}"#);
    }

    #[test]
    fn test_shared_pointer_is_not_circular() {
        let shared = Pointer::new(1);
        let value = Value::Array(vec![
            Value::Pointer(shared.clone()),
            Value::Pointer(shared),
        ]);
        assert_eq!(value.to_json(), json!([1, 1]));
    }

    #[test]
    fn test_cyclic_values_compare_and_clone() {
        let (a, b) = (cyclic_node(), cyclic_node());
        assert_eq!(Value::Pointer(a.clone()), Value::Pointer(b));

        let copy = Value::Pointer(a.clone()).deep_clone();
        let copied = copy.as_pointer().map(Pointer::innermost).expect("pointer");
        assert!(!copied.ptr_eq(&a));
        match copied.get().get("next") {
            Some(Value::Pointer(next)) => assert!(next.ptr_eq(&copied)),
            other => panic!("expected pointer, got {other:?}"),
        }
    }

    #[test]
    fn test_typed_extraction() {
        assert_eq!(String::from_value(Value::from("x")), Some("x".to_string()));
        assert_eq!(Option::<i64>::from_value(Value::Nil), Some(None));
        assert_eq!(Vec::<i64>::from_value(Value::from(vec![1i64, 2])), Some(vec![1, 2]));
        assert_eq!(i64::from_value(Value::from("x")), None);
    }

    #[test]
    fn test_serialize_as_json() {
        let value = Value::from(json!({"a": [1, "b", null]}));
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"a":[1,"b",null]}"#);
    }
}
