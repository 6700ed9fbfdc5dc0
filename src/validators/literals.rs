//! Literal, enumeration and custom-predicate schemas

use super::base::{schema_internals, Schema};
use super::internals::{SchemaInternals, TypeCode};
use super::validation::{ParseContext, ParsePayload};
use crate::error::{Error, Result};
use crate::issues::{IssueCode, RawIssue};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Exactly one permitted value
///
/// Membership is checked by the engine through `internals.values`.
#[derive(Debug, Clone)]
pub struct LiteralSchema {
    internals: SchemaInternals,
}

impl LiteralSchema {
    /// Create a literal schema
    pub fn new(value: impl Into<Value>) -> Self {
        let mut internals = SchemaInternals::new(TypeCode::Literal);
        internals.values = vec![value.into()];
        Self { internals }
    }

    /// The permitted value
    pub fn value(&self) -> &Value {
        &self.internals.values[0]
    }
}

impl Schema for LiteralSchema {
    schema_internals!();

    fn parse_value(&self, _payload: &mut ParsePayload, _ctx: &mut ParseContext) {}
}

/// One of a fixed set of values
#[derive(Debug, Clone)]
pub struct EnumSchema {
    internals: SchemaInternals,
}

impl EnumSchema {
    /// Create an enumeration; duplicates are dropped and an empty set is rejected
    pub fn new<I, V>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut unique: Vec<Value> = Vec::new();
        for value in values {
            let value = value.into();
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        if unique.is_empty() {
            return Err(Error::Schema("enumeration needs at least one value".into()));
        }
        let mut internals = SchemaInternals::new(TypeCode::Enum);
        internals.values = unique;
        Ok(Self { internals })
    }

    /// Permitted values in declaration order
    pub fn options(&self) -> &[Value] {
        &self.internals.values
    }

    /// Enumeration restricted to `keep`
    pub fn extract<I, V>(&self, keep: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let keep: Vec<Value> = keep.into_iter().map(Into::into).collect();
        for value in &keep {
            if !self.internals.values.contains(value) {
                return Err(Error::Schema(format!("{} is not an option", value)));
            }
        }
        Self::new(keep)
    }

    /// Enumeration without `drop`
    pub fn exclude<I, V>(&self, drop: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let drop: Vec<Value> = drop.into_iter().map(Into::into).collect();
        Self::new(
            self.internals
                .values
                .iter()
                .filter(|v| !drop.contains(v))
                .cloned(),
        )
    }
}

impl Schema for EnumSchema {
    schema_internals!();

    fn parse_value(&self, _payload: &mut ParsePayload, _ctx: &mut ParseContext) {}
}

/// Predicate over a value of any kind
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Schema defined by a user predicate
#[derive(Clone)]
pub struct CustomSchema {
    internals: SchemaInternals,
    predicate: Predicate,
}

impl CustomSchema {
    /// Create a custom schema
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            internals: SchemaInternals::new(TypeCode::Custom),
            predicate: Arc::new(predicate),
        }
    }
}

impl fmt::Debug for CustomSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSchema")
            .field("internals", &self.internals)
            .finish_non_exhaustive()
    }
}

impl Schema for CustomSchema {
    schema_internals!();

    fn parse_value(&self, payload: &mut ParsePayload, _ctx: &mut ParseContext) {
        if !(self.predicate)(&payload.value) {
            let input = payload.value.clone();
            payload.add_issue(RawIssue::new(IssueCode::Custom).with_input(input).abort());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::base::SchemaExt;

    #[test]
    fn test_literal() {
        let schema = LiteralSchema::new("admin");
        assert!(schema.parse("admin").is_ok());
        let err = schema.parse("user").unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::InvalidValue);
        assert_eq!(err.message, "Invalid input: expected \"admin\"");
    }

    #[test]
    fn test_nil_literal_accepts_nil() {
        assert!(LiteralSchema::new(Value::Nil).parse(Value::Nil).is_ok());
    }

    #[test]
    fn test_enum_membership() {
        let schema = EnumSchema::new(["red", "green", "red"]).unwrap();
        assert_eq!(schema.options().len(), 2);
        assert!(schema.parse("green").is_ok());
        let err = schema.parse("blue").unwrap_err();
        assert_eq!(err.issues[0].values.len(), 2);
        assert_eq!(err.message, "Invalid option: expected one of \"red\"|\"green\"");
    }

    #[test]
    fn test_enum_extract_exclude() {
        let schema = EnumSchema::new(["a", "b", "c"]).unwrap();
        assert_eq!(schema.extract(["a"]).unwrap().options(), &[Value::from("a")]);
        assert!(schema.extract(["z"]).is_err());
        assert_eq!(schema.exclude(["a"]).unwrap().options().len(), 2);
        assert!(EnumSchema::new(Vec::<Value>::new()).is_err());
    }

    #[test]
    fn test_custom_predicate() {
        let even = CustomSchema::new(|v| v.as_i64().map_or(false, |i| i % 2 == 0));
        assert!(even.parse(4i64).is_ok());
        assert_eq!(even.parse(3i64).unwrap_err().issues[0].code, IssueCode::Custom);
    }
}
