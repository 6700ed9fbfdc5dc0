//! Parse engine
//!
//! Drives one value through one schema:
//!
//! ```text
//! start ─► nil? ─► modifiers ─► done | fail
//!            │          └─► continue
//!            ▼                   │
//!        pointer? ─► deref ──────┤
//!                                ▼
//!                 type check ─► literal values ─► pattern ─► checks ─► transform
//! ```
//!
//! Composites call back into [`parse_at`] for their children, so depth
//! limits, pointer handling and source tagging apply at every level.

use super::base::Schema;
use super::checks::{check_aborted, run_checks, Check};
use super::internals::TransformFn;
use super::modifiers::{process_nil, NilOutcome};
use super::validation::{ParseContext, ParsePayload, RefinementContext};
use crate::error::{Error, ValidationError};
use crate::format::format_path;
use crate::issues::{finalize, FinalizedIssue, IssueCode, IssueSource, PathSegment, RawIssue};
use crate::value::{FromValue, Pointer, Value};
use tracing::trace;

// =============================================================================
// Entry points
// =============================================================================

/// Parse a value from the root and finalize any issues
pub fn parse_root(
    schema: &dyn Schema,
    value: Value,
    mut ctx: ParseContext,
) -> Result<Value, ValidationError> {
    let mut payload = ParsePayload::new(value);
    parse_schema(schema, &mut payload, &mut ctx);
    if payload.issues.is_empty() {
        Ok(payload.value)
    } else {
        Err(finalize_all(payload.issues, &ctx))
    }
}

/// Finalize raw issues in order
pub fn finalize_issues(issues: Vec<RawIssue>, ctx: &ParseContext) -> Vec<FinalizedIssue> {
    issues.into_iter().map(|issue| finalize(issue, ctx)).collect()
}

/// Finalize raw issues into a [`ValidationError`]
pub fn finalize_all(issues: Vec<RawIssue>, ctx: &ParseContext) -> ValidationError {
    ValidationError::new(finalize_issues(issues, ctx))
}

/// Typed extraction of a parsed value
pub fn extract<T: FromValue>(value: Value) -> Result<T, ValidationError> {
    let received = value.type_name();
    T::from_value(value).ok_or_else(|| {
        let issue = RawIssue::new(IssueCode::InvalidType)
            .with_property("expected", T::type_name())
            .with_property("received", received)
            .abort();
        finalize_all(vec![issue], &ParseContext::new())
    })
}

/// Parse `value` as the child at `segment` of the current node
///
/// The child's issues are added to `payload`; the child's output is returned.
/// Each child is one nesting level for [`Limits`](crate::Limits); past the
/// limit the child is not parsed and an aborting issue is recorded instead.
pub fn parse_at(
    schema: &dyn Schema,
    value: Value,
    segment: PathSegment,
    payload: &mut ParsePayload,
    ctx: &mut ParseContext,
) -> Value {
    let depth = ctx.depth + 1;
    payload.push_path(segment);

    let output = match ctx.limits.check_depth(depth) {
        Err(err) => {
            payload.add_issue(
                RawIssue::custom(err.to_string())
                    .with_input(value)
                    .with_property("limit", "max_depth")
                    .abort(),
            );
            Value::Nil
        }
        Ok(()) => {
            let saved = std::mem::replace(&mut payload.value, value);
            ctx.depth = depth;
            parse_schema(schema, payload, ctx);
            ctx.depth -= 1;
            std::mem::replace(&mut payload.value, saved)
        }
    };

    payload.pop_path();
    output
}

// =============================================================================
// Engine
// =============================================================================

/// Parse the payload value in place
pub fn parse_schema(schema: &dyn Schema, payload: &mut ParsePayload, ctx: &mut ParseContext) {
    let internals = schema.internals();

    trace!(
        schema = %internals.id,
        kind = %internals.type_code,
        depth = ctx.depth,
        path = %format_path(&payload.path),
        "parsing"
    );

    let start = payload.issues.len();
    let was_prefault = ctx.is_prefault_context;
    let entered_nil = payload.value.is_nil();
    payload.short_circuited = false;

    let outcome = if entered_nil {
        process_nil(schema, payload, ctx)
    } else {
        NilOutcome::Continue
    };

    let mut short_circuited = outcome == NilOutcome::ShortCircuit;
    if outcome == NilOutcome::Continue {
        let pointer = match &payload.value {
            Value::Pointer(p) => Some(p.clone()),
            _ => None,
        };
        match pointer {
            Some(pointer) => parse_pointer(schema, pointer, payload, ctx, start),
            None => validate_value(schema, payload, ctx, start),
        }

        // a wrapper passes on a default substituted by the schema it delegated nil to
        short_circuited =
            entered_nil && internals.type_code.delegates_nil() && payload.short_circuited;

        if let Some(transform) = &internals.transform {
            if !short_circuited && !payload.has_issues_since(start) {
                apply_transform(transform, payload, ctx);
            }
        }
    }

    tag_sources(schema, payload, start);
    payload.short_circuited = short_circuited;
    ctx.is_prefault_context = was_prefault;
}

/// Validate through a pointer, keeping the caller's pointer as the output
fn parse_pointer(
    schema: &dyn Schema,
    pointer: Pointer,
    payload: &mut ParsePayload,
    ctx: &mut ParseContext,
    start: usize,
) {
    let cell = pointer.innermost();
    let key = (schema.id(), cell.address());
    if ctx.active.contains(&key) {
        let input = payload.value.clone();
        payload.add_issue(
            RawIssue::custom("Circular reference detected")
                .with_input(input)
                .with_property("cycle", true)
                .abort(),
        );
        return;
    }

    let pointee = cell.get();
    ctx.active.push(key);
    payload.value = pointee.clone();
    validate_value(schema, payload, ctx, start);
    ctx.active.pop();

    let result = std::mem::replace(&mut payload.value, Value::Pointer(pointer));
    if !payload.has_issues_since(start) && result != pointee {
        cell.set(result);
    }
}

/// Type check, literal values, pattern and checks for a non-pointer value
fn validate_value(
    schema: &dyn Schema,
    payload: &mut ParsePayload,
    ctx: &mut ParseContext,
    start: usize,
) {
    let internals = schema.internals();
    schema.parse_value(payload, ctx);

    if internals.type_code.delegates_nil() && payload.short_circuited {
        return;
    }

    if check_aborted(payload, start) {
        let gated: Vec<Check> = internals
            .checks
            .iter()
            .filter(|c| c.is_gated())
            .cloned()
            .collect();
        run_checks(&gated, payload, ctx);
        return;
    }

    if !internals.values.is_empty() && !internals.values.contains(&payload.value) {
        let input = payload.value.clone();
        payload.add_issue(
            RawIssue::new(IssueCode::InvalidValue)
                .with_input(input)
                .with_property("values", internals.values.clone())
                .abort(),
        );
        return;
    }

    if let (Some(pattern), Value::String(s)) = (&internals.pattern, &payload.value) {
        if !pattern.is_match(s) {
            let format = internals
                .bag
                .get("format")
                .and_then(Value::as_str)
                .unwrap_or("regex")
                .to_string();
            let input = payload.value.clone();
            payload.add_issue(
                RawIssue::new(IssueCode::InvalidFormat)
                    .with_input(input)
                    .with_property("format", format)
                    .with_property("pattern", pattern.as_str())
                    .with_property("origin", "string"),
            );
        }
    }

    run_checks(&internals.checks, payload, ctx);
}

fn apply_transform(transform: &TransformFn, payload: &mut ParsePayload, ctx: &ParseContext) {
    let value = match std::mem::take(&mut payload.value) {
        Value::Pointer(p) => p.resolve(),
        value => value,
    };

    let result = {
        let mut rctx = RefinementContext::new(payload, ctx);
        transform.apply(value, &mut rctx)
    };

    match result {
        Ok(value) => payload.value = value,
        Err(Error::Validation(err)) => {
            for issue in err.issues {
                payload.add_issue(
                    RawIssue::custom(issue.message)
                        .with_path(issue.path)
                        .abort(),
                );
            }
        }
        Err(Error::Transform(message)) | Err(Error::Other(message)) => {
            payload.add_issue(RawIssue::custom(message).abort());
        }
        Err(other) => payload.add_issue(RawIssue::custom(other.to_string()).abort()),
    }
}

/// Attribute untagged issues from `start` onward to this schema
fn tag_sources(schema: &dyn Schema, payload: &mut ParsePayload, start: usize) {
    let internals = schema.internals();
    for issue in payload.issues.iter_mut().skip(start) {
        if issue.source.is_none() {
            issue.source = Some(IssueSource {
                kind: internals.type_code.as_str().to_string(),
                error_map: internals.error_map.clone(),
            });
        }
    }
}
