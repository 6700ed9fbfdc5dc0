//! Checks
//!
//! A check is a named constraint applied after a value has been accepted by
//! its schema's type check. Checks run in insertion order; an aborting check
//! that reports issues stops the rest of the list.

use super::helpers::{compare_values, is_multiple_of, origin_of};
use super::internals::SchemaInternals;
use super::validation::{ParseContext, ParsePayload, RefinementContext};
use crate::issues::{ErrorMap, IssueCode, IssueSource, PathSegment, RawIssue};
use crate::value::Value;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Kind tag of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    /// Minimum length / size
    MinLength,
    /// Maximum length / size
    MaxLength,
    /// Exact length / size
    LengthEquals,
    /// Regular expression
    Regex,
    /// String prefix
    StartsWith,
    /// String suffix
    EndsWith,
    /// String substring
    Includes,
    /// All-lowercase string
    Lowercase,
    /// All-uppercase string
    Uppercase,
    /// Named string format (email, uuid, ...)
    Format,
    /// Lower bound
    GreaterThan,
    /// Upper bound
    LessThan,
    /// Divisibility
    MultipleOf,
    /// Finite float
    Finite,
    /// Value rewrite
    Overwrite,
    /// User predicate
    Refine,
    /// User check with context
    Custom,
}

impl CheckKind {
    /// Get the kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::MinLength => "min_length",
            CheckKind::MaxLength => "max_length",
            CheckKind::LengthEquals => "length_equals",
            CheckKind::Regex => "regex",
            CheckKind::StartsWith => "starts_with",
            CheckKind::EndsWith => "ends_with",
            CheckKind::Includes => "includes",
            CheckKind::Lowercase => "lowercase",
            CheckKind::Uppercase => "uppercase",
            CheckKind::Format => "format",
            CheckKind::GreaterThan => "greater_than",
            CheckKind::LessThan => "less_than",
            CheckKind::MultipleOf => "multiple_of",
            CheckKind::Finite => "finite",
            CheckKind::Overwrite => "overwrite",
            CheckKind::Refine => "refine",
            CheckKind::Custom => "custom",
        }
    }

    /// Kinds that are still applied when nil is accepted
    pub fn is_nil_applicable(&self) -> bool {
        matches!(self, CheckKind::Overwrite | CheckKind::Refine | CheckKind::Custom)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check body: may add issues and may replace the payload value
pub type CheckFn = Arc<dyn Fn(&mut ParsePayload, &ParseContext) + Send + Sync>;
/// Gating predicate, evaluated on the current value
pub type WhenFn = Arc<dyn Fn(&ParsePayload) -> bool + Send + Sync>;
/// Hook fired on the new schema when a check is attached
pub type AttachFn = Arc<dyn Fn(&mut SchemaInternals) + Send + Sync>;

/// Static definition of a check
#[derive(Debug, Clone)]
pub struct CheckDef {
    /// Kind tag
    pub kind: CheckKind,
    /// Stop the check list if this check reports issues
    pub abort: bool,
    /// Error map override for this check's issues
    pub error: Option<ErrorMap>,
}

/// A single named constraint
#[derive(Clone)]
pub struct Check {
    def: CheckDef,
    run: CheckFn,
    on_attach: Vec<AttachFn>,
    when: Option<WhenFn>,
}

impl Check {
    /// Create a check from a kind and a body
    pub fn new<F>(kind: CheckKind, run: F) -> Self
    where
        F: Fn(&mut ParsePayload, &ParseContext) + Send + Sync + 'static,
    {
        Self {
            def: CheckDef {
                kind,
                abort: false,
                error: None,
            },
            run: Arc::new(run),
            on_attach: Vec::new(),
            when: None,
        }
    }

    /// The check's definition
    pub fn def(&self) -> &CheckDef {
        &self.def
    }

    /// The check's kind tag
    pub fn kind(&self) -> CheckKind {
        self.def.kind
    }

    /// Stop further checks if this one fails
    pub fn abort(mut self) -> Self {
        self.def.abort = true;
        self
    }

    /// Override the message of this check's issues
    pub fn with_error(mut self, error: impl Into<ErrorMap>) -> Self {
        self.def.error = Some(error.into());
        self
    }

    /// Only run when the predicate holds for the current value
    pub fn when<F>(mut self, f: F) -> Self
    where
        F: Fn(&ParsePayload) -> bool + Send + Sync + 'static,
    {
        self.when = Some(Arc::new(f));
        self
    }

    /// Add a hook fired when the check is attached to a schema
    pub fn on_attach<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut SchemaInternals) + Send + Sync + 'static,
    {
        self.on_attach.push(Arc::new(f));
        self
    }

    /// Whether the check carries a `when` predicate
    pub fn is_gated(&self) -> bool {
        self.when.is_some()
    }

    pub(crate) fn attach(&self, internals: &mut SchemaInternals) {
        for hook in &self.on_attach {
            hook(internals);
        }
    }

    fn gated_off(&self, payload: &ParsePayload) -> bool {
        match &self.when {
            Some(when) => {
                let probe = ParsePayload::new(payload.value.clone()).with_path(payload.path.clone());
                !when(&probe)
            }
            None => false,
        }
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("kind", &self.def.kind)
            .field("abort", &self.def.abort)
            .field("gated", &self.when.is_some())
            .finish()
    }
}

// =============================================================================
// Runner
// =============================================================================

/// Run a check list over a payload
pub fn run_checks(checks: &[Check], payload: &mut ParsePayload, ctx: &ParseContext) {
    if checks.is_empty() {
        return;
    }
    payload.issues.reserve(checks.len());

    for check in checks {
        if check.gated_off(payload) {
            continue;
        }

        let start = payload.issues.len();
        (check.run)(payload, ctx);
        if !payload.has_issues_since(start) {
            continue;
        }

        for issue in &mut payload.issues[start..] {
            if check.def.abort {
                issue.continuable = false;
            }
            if let Some(map) = &check.def.error {
                if issue.message.is_none() {
                    issue.message = map.resolve(issue);
                }
                if issue.source.is_none() {
                    issue.source = Some(IssueSource {
                        kind: check.def.kind.as_str().to_string(),
                        error_map: Some(map.clone()),
                    });
                }
            }
        }

        if check.def.abort {
            break;
        }
    }
}

/// Whether any issue from `start` onward aborts
pub fn check_aborted(payload: &ParsePayload, start: usize) -> bool {
    payload
        .issues
        .get(start..)
        .map(|issues| issues.iter().any(|i| !i.continuable))
        .unwrap_or(false)
}

// =============================================================================
// Size checks
// =============================================================================

fn size_check(kind: CheckKind, bound: usize) -> Check {
    Check::new(kind, move |payload, _| {
        let Some(len) = payload.value.length() else {
            return;
        };
        let origin = origin_of(&payload.value);
        let issue = match kind {
            CheckKind::MinLength if len < bound => RawIssue::new(IssueCode::TooSmall)
                .with_property("minimum", bound)
                .with_property("inclusive", true),
            CheckKind::MaxLength if len > bound => RawIssue::new(IssueCode::TooBig)
                .with_property("maximum", bound)
                .with_property("inclusive", true),
            CheckKind::LengthEquals if len < bound => RawIssue::new(IssueCode::TooSmall)
                .with_property("minimum", bound)
                .with_property("inclusive", true)
                .with_property("exact", true),
            CheckKind::LengthEquals if len > bound => RawIssue::new(IssueCode::TooBig)
                .with_property("maximum", bound)
                .with_property("inclusive", true)
                .with_property("exact", true),
            _ => return,
        };
        let input = payload.value.clone();
        payload.add_issue(issue.with_property("origin", origin).with_input(input));
    })
}

/// Length / size must be at least `min`
pub fn min_length(min: usize) -> Check {
    size_check(CheckKind::MinLength, min).on_attach(move |internals| {
        internals.bag.insert("minimum".into(), Value::from(min));
    })
}

/// Length / size must be at most `max`
pub fn max_length(max: usize) -> Check {
    size_check(CheckKind::MaxLength, max).on_attach(move |internals| {
        internals.bag.insert("maximum".into(), Value::from(max));
    })
}

/// Length / size must be exactly `len`
pub fn length(len: usize) -> Check {
    size_check(CheckKind::LengthEquals, len).on_attach(move |internals| {
        internals.bag.insert("minimum".into(), Value::from(len));
        internals.bag.insert("maximum".into(), Value::from(len));
    })
}

// =============================================================================
// String checks
// =============================================================================

fn string_check<F>(kind: CheckKind, format: &'static str, ok: F, props: Vec<(&'static str, String)>) -> Check
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    Check::new(kind, move |payload, _| {
        let Value::String(s) = &payload.value else {
            return;
        };
        if ok(s) {
            return;
        }
        let mut issue = RawIssue::new(IssueCode::InvalidFormat)
            .with_input(payload.value.clone())
            .with_property("format", format)
            .with_property("origin", "string");
        for (key, value) in &props {
            issue = issue.with_property(key, value.as_str());
        }
        payload.add_issue(issue);
    })
}

/// String must match a regular expression
pub fn regex(re: Regex) -> Check {
    let pattern = re.as_str().to_string();
    string_check(
        CheckKind::Regex,
        "regex",
        move |s| re.is_match(s),
        vec![("pattern", pattern)],
    )
}

/// String must start with `prefix`
pub fn starts_with(prefix: impl Into<String>) -> Check {
    let prefix = prefix.into();
    let expected = prefix.clone();
    string_check(
        CheckKind::StartsWith,
        "starts_with",
        move |s| s.starts_with(&expected),
        vec![("prefix", prefix)],
    )
}

/// String must end with `suffix`
pub fn ends_with(suffix: impl Into<String>) -> Check {
    let suffix = suffix.into();
    let expected = suffix.clone();
    string_check(
        CheckKind::EndsWith,
        "ends_with",
        move |s| s.ends_with(&expected),
        vec![("suffix", suffix)],
    )
}

/// String must contain `needle`
pub fn includes(needle: impl Into<String>) -> Check {
    let needle = needle.into();
    let expected = needle.clone();
    string_check(
        CheckKind::Includes,
        "includes",
        move |s| s.contains(&expected),
        vec![("includes", needle)],
    )
}

/// String must not contain uppercase characters
pub fn lowercase() -> Check {
    string_check(
        CheckKind::Lowercase,
        "lowercase",
        |s| !s.chars().any(char::is_uppercase),
        Vec::new(),
    )
}

/// String must not contain lowercase characters
pub fn uppercase() -> Check {
    string_check(
        CheckKind::Uppercase,
        "uppercase",
        |s| !s.chars().any(char::is_lowercase),
        Vec::new(),
    )
}

/// String must satisfy a named format predicate
pub fn string_format<F>(format: &'static str, ok: F) -> Check
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    string_check(CheckKind::Format, format, ok, Vec::new()).on_attach(move |internals| {
        internals.bag.insert("format".into(), Value::from(format));
    })
}

// =============================================================================
// Bound checks
// =============================================================================

fn bound_check(kind: CheckKind, bound: Value, inclusive: bool) -> Check {
    let attach_bound = bound.clone();
    Check::new(kind, move |payload, _| {
        let Some(ordering) = compare_values(&payload.value, &bound) else {
            return;
        };
        let passes = match (kind, inclusive) {
            (CheckKind::GreaterThan, true) => ordering != Ordering::Less,
            (CheckKind::GreaterThan, false) => ordering == Ordering::Greater,
            (_, true) => ordering != Ordering::Greater,
            (_, false) => ordering == Ordering::Less,
        };
        if passes {
            return;
        }
        let issue = if kind == CheckKind::GreaterThan {
            RawIssue::new(IssueCode::TooSmall).with_property("minimum", bound.clone())
        } else {
            RawIssue::new(IssueCode::TooBig).with_property("maximum", bound.clone())
        };
        let input = payload.value.clone();
        payload.add_issue(
            issue
                .with_property("inclusive", inclusive)
                .with_property("origin", origin_of(&input))
                .with_input(input),
        );
    })
    .on_attach(move |internals| {
        let key = if kind == CheckKind::GreaterThan {
            "minimum"
        } else {
            "maximum"
        };
        internals.bag.insert(key.into(), attach_bound.clone());
        internals.bag.insert(format!("{}_inclusive", key), Value::Bool(inclusive));
    })
}

/// Value must be greater than `bound`
pub fn gt(bound: impl Into<Value>) -> Check {
    bound_check(CheckKind::GreaterThan, bound.into(), false)
}

/// Value must be greater than or equal to `bound`
pub fn gte(bound: impl Into<Value>) -> Check {
    bound_check(CheckKind::GreaterThan, bound.into(), true)
}

/// Value must be less than `bound`
pub fn lt(bound: impl Into<Value>) -> Check {
    bound_check(CheckKind::LessThan, bound.into(), false)
}

/// Value must be less than or equal to `bound`
pub fn lte(bound: impl Into<Value>) -> Check {
    bound_check(CheckKind::LessThan, bound.into(), true)
}

/// Number must be a multiple of `divisor`
pub fn multiple_of(divisor: impl Into<Value>) -> Check {
    let divisor = divisor.into();
    Check::new(CheckKind::MultipleOf, move |payload, _| {
        if is_multiple_of(&payload.value, &divisor) == Some(false) {
            let input = payload.value.clone();
            payload.add_issue(
                RawIssue::new(IssueCode::NotMultipleOf)
                    .with_property("divisor", divisor.clone())
                    .with_property("origin", "number")
                    .with_input(input),
            );
        }
    })
}

/// Float must be neither infinite nor NaN
pub fn finite() -> Check {
    Check::new(CheckKind::Finite, |payload, _| {
        if let Value::Float(f) = payload.value {
            if !f.is_finite() {
                let received = if f.is_nan() { "nan" } else { "infinity" };
                let input = payload.value.clone();
                payload.add_issue(
                    RawIssue::new(IssueCode::InvalidType)
                        .with_input(input)
                        .with_property("expected", "number")
                        .with_property("received", received),
                );
            }
        }
    })
}

// =============================================================================
// User checks
// =============================================================================

/// Replace the value with `f(value)`
pub fn overwrite<F>(f: F) -> Check
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    Check::new(CheckKind::Overwrite, move |payload, _| {
        let value = std::mem::take(&mut payload.value);
        payload.value = f(value);
    })
}

/// Options for [`refine`]
#[derive(Clone, Default)]
pub struct RefineParams {
    /// Message or error map for the issue
    pub error: Option<ErrorMap>,
    /// Path appended to the current path
    pub path: Vec<PathSegment>,
    /// Stop further checks if the refinement fails
    pub abort: bool,
    /// Gating predicate
    pub when: Option<WhenFn>,
}

impl RefineParams {
    /// Create empty params
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error message or map
    pub fn error(mut self, error: impl Into<ErrorMap>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Set the relative path of the issue
    pub fn path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Make the refinement aborting
    pub fn abort(mut self) -> Self {
        self.abort = true;
        self
    }

    /// Gate the refinement
    pub fn when<F>(mut self, f: F) -> Self
    where
        F: Fn(&ParsePayload) -> bool + Send + Sync + 'static,
    {
        self.when = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for RefineParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefineParams")
            .field("path", &self.path)
            .field("abort", &self.abort)
            .finish()
    }
}

/// User predicate; a `false` result reports a `custom` issue
pub fn refine<F>(predicate: F, params: RefineParams) -> Check
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    let path = params.path.clone();
    let mut check = Check::new(CheckKind::Refine, move |payload, _| {
        if !predicate(&payload.value) {
            let input = payload.value.clone();
            payload.add_issue(
                RawIssue::new(IssueCode::Custom)
                    .with_input(input)
                    .with_path(path.clone()),
            );
        }
    });
    check.when = params.when;
    if let Some(error) = params.error {
        check = check.with_error(error);
    }
    if params.abort {
        check = check.abort();
    }
    check
}

/// User check with access to a [`RefinementContext`]
pub fn custom<F>(f: F) -> Check
where
    F: Fn(&Value, &mut RefinementContext<'_>) + Send + Sync + 'static,
{
    Check::new(CheckKind::Custom, move |payload, ctx| {
        let value = payload.value.clone();
        let mut rctx = RefinementContext::new(payload, ctx);
        f(&value, &mut rctx);
    })
}
