//! Limits and constraints for parsing
//!
//! Recursive schemas applied to deeply nested input could otherwise exhaust
//! the stack; the depth limit turns that into an ordinary issue. Depth counts
//! nesting levels of the input (object fields, array and tuple elements,
//! record values), not schema wrappers.

use crate::error::{Error, Result};

/// Per-parse limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum nesting depth of the input
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self { max_depth: 32 }
    }

    /// Create permissive limits (less restrictive, use with caution)
    ///
    /// Parsing at this depth needs more than the default 2 MiB thread stack.
    pub fn permissive() -> Self {
        Self { max_depth: 1024 }
    }

    /// Set the maximum depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Check if nesting depth is within limits
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            Err(Error::LimitExceeded(format!(
                "nesting depth {} exceeds maximum {}",
                depth, self.max_depth
            )))
        } else {
            Ok(())
        }
    }
}
