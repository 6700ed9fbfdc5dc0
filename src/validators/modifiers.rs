//! Nil handling
//!
//! Consulted only when the input is nil (or a pointer chain ending in nil).
//! The installed modifiers are tried in priority order:
//!
//! 1. default: substitute a fresh copy, apply overwrite checks only, stop
//! 2. prefault: substitute and continue with normal parsing
//! 3. non-optional: fail unless the input is pointer-shaped
//! 4. optional / nilable / nil pointer: accept, apply nil-applicable checks
//!
//! The most recently installed substitute or acceptance family is moved to
//! the front, so `prefault("p").optional()` accepts nil while
//! `optional().prefault("p")` substitutes. A substitute always satisfies
//! non-optional. When none of them applies:
//!
//! 5. kinds that accept nil, or nil listed in `values`: continue
//! 6. wrapper kinds: continue and let the inner schemas decide
//! 7. anything else: fail with `invalid_type`

use super::base::Schema;
use super::checks::{run_checks, Check, CheckKind};
use super::internals::{ModifierFamily, SchemaInternals};
use super::validation::{ParseContext, ParsePayload};
use crate::issues::RawIssue;
use crate::value::Value;

/// What the engine does after nil handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NilOutcome {
    /// The payload holds the final value (or an issue); stop
    Done,
    /// A default was substituted; stop and skip everything downstream
    ShortCircuit,
    /// Continue with type validation on the payload value
    Continue,
}

const PRIORITY: [ModifierFamily; 4] = [
    ModifierFamily::Default,
    ModifierFamily::Prefault,
    ModifierFamily::NonOptional,
    ModifierFamily::Optional,
];

/// Families in the order they are tried for `internals`
fn precedence(internals: &SchemaInternals) -> Vec<ModifierFamily> {
    let last = internals.last_modifier.and_then(|family| match family {
        ModifierFamily::Nilable => Some(ModifierFamily::Optional),
        ModifierFamily::NonOptional => None,
        other => Some(other),
    });
    let mut order: Vec<ModifierFamily> = last.into_iter().collect();
    order.extend(PRIORITY.iter().copied().filter(|f| Some(*f) != last));
    order
}

fn filtered(checks: &[Check], keep: impl Fn(CheckKind) -> bool) -> Vec<Check> {
    checks
        .iter()
        .filter(|c| keep(c.kind()))
        .cloned()
        .collect()
}

/// Apply the nil-handling modifiers of `schema` to a nil payload
pub(crate) fn process_nil(
    schema: &dyn Schema,
    payload: &mut ParsePayload,
    ctx: &mut ParseContext,
) -> NilOutcome {
    let internals = schema.internals();
    let pointer_shaped = matches!(payload.value, Value::Pointer(_));

    for family in precedence(internals) {
        match family {
            ModifierFamily::Default => {
                if let Some(default) = &internals.default {
                    payload.value = default.resolve();
                    let overwrites = filtered(&internals.checks, |k| k == CheckKind::Overwrite);
                    run_checks(&overwrites, payload, ctx);
                    return NilOutcome::ShortCircuit;
                }
            }
            ModifierFamily::Prefault => {
                if let Some(prefault) = &internals.prefault {
                    let substitute = prefault.resolve();
                    if !substitute.is_nil() {
                        payload.value = substitute;
                        ctx.is_prefault_context = true;
                        return NilOutcome::Continue;
                    }
                }
            }
            ModifierFamily::NonOptional => {
                if internals.non_optional && !pointer_shaped {
                    payload.add_issue(
                        RawIssue::invalid_type(internals.type_code.as_str(), &payload.value)
                            .with_property("received", "undefined"),
                    );
                    return NilOutcome::Done;
                }
            }
            ModifierFamily::Optional | ModifierFamily::Nilable => {
                if internals.optional || internals.nilable || pointer_shaped {
                    let applicable = filtered(&internals.checks, |k| k.is_nil_applicable());
                    run_checks(&applicable, payload, ctx);
                    return NilOutcome::Done;
                }
            }
        }
    }

    if internals.type_code.accepts_nil() || internals.values.iter().any(Value::is_nil) {
        return NilOutcome::Continue;
    }

    if internals.type_code.delegates_nil() {
        return NilOutcome::Continue;
    }

    payload.add_issue(RawIssue::invalid_type(
        internals.type_code.as_str(),
        &payload.value,
    ));
    NilOutcome::Done
}
