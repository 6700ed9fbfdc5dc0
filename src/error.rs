//! Error types for shapeguard
//!
//! [`ValidationError`] is the single data-error type returned by parsing. The
//! [`Error`] enum covers everything else: schema construction problems,
//! failing transforms and exceeded limits.

use crate::format::format_path;
use crate::issues::FinalizedIssue;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias using shapeguard Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for shapeguard operations
#[derive(Error, Debug)]
pub enum Error {
    /// Data failed validation
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Schema could not be constructed
    #[error("schema error: {0}")]
    Schema(String),

    /// Value error (invalid value for an operation)
    #[error("value error: {0}")]
    Value(String),

    /// User transform failed
    #[error("transform error: {0}")]
    Transform(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Ordered aggregate of finalized issues
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Top-level message, the first issue's message by default
    pub message: String,
    /// Issues in insertion order
    pub issues: Vec<FinalizedIssue>,
}

impl ValidationError {
    /// Create an error from finalized issues
    pub fn new(issues: Vec<FinalizedIssue>) -> Self {
        let message = issues
            .first()
            .map(|i| i.message.clone())
            .unwrap_or_else(|| "Invalid input".to_string());
        Self { message, issues }
    }

    /// Override the top-level message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Number of issues
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Whether there are no issues
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Serialize to the stable JSON form
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(first) = self.issues.first() {
            if !first.path.is_empty() {
                write!(f, " at {}", format_path(&first.path))?;
            }
        }

        if self.issues.len() > 1 {
            write!(f, " (and {} more issues)", self.issues.len() - 1)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::{finalize, IssueCode, PathSegment, RawIssue};
    use crate::validators::validation::ParseContext;
    use crate::value::Value;

    fn issue_at(path: Vec<PathSegment>) -> FinalizedIssue {
        let raw = RawIssue::invalid_type("string", &Value::Int(1)).with_path(path);
        finalize(raw, &ParseContext::new())
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(vec![
            issue_at(vec!["user".into(), 0usize.into()]),
            issue_at(vec![]),
        ]);

        let msg = format!("{}", err);
        assert!(msg.contains("expected string, received number"));
        assert!(msg.contains("at user[0]"));
        assert!(msg.contains("and 1 more issues"));
    }

    #[test]
    fn test_validation_error_json_shape() {
        let err = ValidationError::new(vec![issue_at(vec!["name".into()])]);
        let json = err.to_json();
        assert_eq!(json["issues"][0]["code"], "invalid_type");
        assert_eq!(json["issues"][0]["path"][0], "name");
        assert!(json["issues"][0].get("input").is_none());
        assert_eq!(json["message"], err.issues[0].message.as_str());
        assert_eq!(err.issues[0].code, IssueCode::InvalidType);
    }

    #[test]
    fn test_error_conversion() {
        let val_err = ValidationError::new(Vec::new());
        let err: Error = val_err.into();
        assert!(matches!(err, Error::Validation(_)));
    }
}
