//! Parse context and payload
//!
//! A [`ParseContext`] carries per-call settings; a [`ParsePayload`] carries the
//! value travelling through the schemas, the issues accumulated so far and the
//! current path. Neither is shared between calls.

use super::internals::SchemaId;
use crate::issues::{ErrorMap, PathSegment, RawIssue};
use crate::limits::Limits;
use crate::value::Value;

/// Per-call parse settings
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// Per-call error map
    pub error_map: Option<ErrorMap>,
    /// Include the offending input in finalized issues
    pub report_input: bool,
    /// Set while a prefault substitute is being parsed
    pub is_prefault_context: bool,
    /// Resource limits
    pub limits: Limits,
    /// Current nesting depth
    pub(crate) depth: usize,
    /// Schemas currently applied to pointer inputs, with the pointer address
    pub(crate) active: Vec<(SchemaId, usize)>,
}

impl ParseContext {
    /// Create a context with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-call error map
    pub fn with_error_map(mut self, map: ErrorMap) -> Self {
        self.error_map = Some(map);
        self
    }

    /// Include inputs in finalized issues
    pub fn with_report_input(mut self, report_input: bool) -> Self {
        self.report_input = report_input;
        self
    }

    /// Set resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Travelling state of one parse
#[derive(Debug, Clone, Default)]
pub struct ParsePayload {
    /// Current value
    pub value: Value,
    /// Issues in insertion order
    pub issues: Vec<RawIssue>,
    /// Path of the current node
    pub path: Vec<PathSegment>,
    /// The last schema parsed substituted its default for nil
    pub(crate) short_circuited: bool,
}

impl ParsePayload {
    /// Create a payload at the root
    pub fn new(value: Value) -> Self {
        Self {
            value,
            issues: Vec::new(),
            path: Vec::new(),
            short_circuited: false,
        }
    }

    /// Set the starting path
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// A payload with the same value and path but no issues
    pub fn fork(&self) -> ParsePayload {
        ParsePayload {
            value: self.value.clone(),
            issues: Vec::new(),
            path: self.path.clone(),
            short_circuited: false,
        }
    }

    /// Enter a child node
    pub fn push_path(&mut self, segment: PathSegment) {
        self.path.push(segment);
    }

    /// Leave a child node
    pub fn pop_path(&mut self) {
        self.path.pop();
    }

    /// Record an issue; its path is taken relative to the current path
    pub fn add_issue(&mut self, mut issue: RawIssue) {
        if !self.path.is_empty() {
            let mut full = self.path.clone();
            full.append(&mut issue.path);
            issue.path = full;
        }
        self.issues.push(issue);
    }

    /// Whether issues were recorded since `start`
    pub fn has_issues_since(&self, start: usize) -> bool {
        self.issues.len() > start
    }
}

/// Context handed to refinements and transforms
pub struct RefinementContext<'a> {
    payload: &'a mut ParsePayload,
    ctx: &'a ParseContext,
}

impl<'a> RefinementContext<'a> {
    pub(crate) fn new(payload: &'a mut ParsePayload, ctx: &'a ParseContext) -> Self {
        Self { payload, ctx }
    }

    /// Report an issue at the current path (plus the issue's relative path)
    pub fn add_issue(&mut self, issue: RawIssue) {
        self.payload.add_issue(issue);
    }

    /// Path of the value being refined
    pub fn path(&self) -> &[PathSegment] {
        &self.payload.path
    }

    /// Whether the value is a prefault substitute
    pub fn is_prefault(&self) -> bool {
        self.ctx.is_prefault_context
    }

    /// The surrounding parse context
    pub fn context(&self) -> &ParseContext {
        self.ctx
    }
}
