//! Fragment evaluation
//!
//! `evaluate` walks a fragment left to right. For each invocation it:
//! 1. looks up the handler and its signature
//! 2. classifies and splits the argument span, rejecting arguments the
//!    signature does not declare
//! 3. evaluates value-position arguments (nested invocations first, then
//!    `$$` references) and leaves code-position arguments as raw text
//! 4. dispatches to the handler and splices the result into the output
//!
//! Handler output is never rescanned for invocations.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument};

use super::context::ExecutionContext;
use super::errors::{EngineError, EngineResult, ErrorContext};
use super::registry::{ParamKind, Signature};
use super::resolver::{lookup, resolve_text, sole_variable};
use super::types::{stringify, Arguments};
use crate::parser::{self, args::dedup_last, Invocation, Tier};

/* ===================== Public API ===================== */

/// Evaluate `fragment` in `ctx`.
///
/// A fragment that is exactly one invocation or exactly one `$$path`
/// reference evaluates to that value unchanged; anything else evaluates to
/// the expanded text.
///
/// If a loop `break`/`continue` is requested on the current loop frame while
/// this fragment is being evaluated, the rest of the fragment is skipped and
/// the text produced so far is returned.
pub fn evaluate<'a>(
    fragment: &'a str,
    ctx: &'a mut ExecutionContext,
) -> BoxFuture<'a, EngineResult<Value>> {
    async move {
        if let Some(path) = sole_variable(fragment) {
            let value = lookup(path, ctx).await?;
            return Ok(value.unwrap_or_else(|| Value::String(String::new())));
        }

        let signal_at_entry = ctx.pending_signal();
        let mut out = String::new();
        let mut cursor = 0;

        while let Some(invocation) = parser::find_next(fragment, cursor)? {
            let text = &fragment[cursor..invocation.span.start];
            out.push_str(&resolve_text(text, ctx).await?);

            let source = &fragment[invocation.span.clone()];
            let value = invoke(&invocation, source, ctx).await?;

            if invocation.span.start == 0 && invocation.span.end == fragment.len() {
                return Ok(value);
            }

            out.push_str(&stringify(&value));
            cursor = invocation.span.end;

            if !signal_at_entry && ctx.pending_signal() {
                debug!("loop signal pending, skipping rest of fragment");
                return Ok(Value::String(out));
            }
        }

        out.push_str(&resolve_text(&fragment[cursor..], ctx).await?);
        Ok(Value::String(out))
    }
    .boxed()
}

/* ===================== Dispatch ===================== */

#[instrument(level = "debug", skip_all, fields(macro_name = %invocation.name))]
async fn invoke(
    invocation: &Invocation,
    source: &str,
    ctx: &mut ExecutionContext,
) -> EngineResult<Value> {
    let name = invocation.name.as_str();
    let handler = ctx
        .registry()
        .get(name)
        .ok_or_else(|| EngineError::UnknownMacro {
            name: name.to_string(),
        })?;

    ctx.descend(name)?;
    let signature = handler.signature();
    let args = match bind_arguments(name, &invocation.raw_args, &signature, ctx).await {
        Ok(args) => args,
        Err(err) => {
            ctx.ascend();
            return Err(err);
        }
    };

    ctx.enter(name);
    debug!(tier = args.tier().number(), args = args.len(), "dispatching");
    let result = handler.execute(args, ctx).await;
    let stack = ctx.call_stack().to_vec();
    ctx.leave();
    ctx.ascend();

    result.map_err(|err| match err {
        EngineError::Domain { kind, message } => EngineError::Runtime(Box::new(ErrorContext {
            kind,
            message,
            stack,
            source_fragment: source.to_string(),
        })),
        other => other,
    })
}

/* ===================== Argument Binding ===================== */

/// Turn a raw argument span into `Arguments` for `signature`.
///
/// Value parameters are evaluated left to right in source order; code
/// parameters are kept as raw text. Every argument is checked against the
/// signature before anything is evaluated.
pub async fn bind_arguments(
    name: &str,
    raw: &str,
    signature: &Signature,
    ctx: &mut ExecutionContext,
) -> EngineResult<Arguments> {
    let tier = parser::classify(raw);
    if !signature.accepts(tier) {
        let accepted: Vec<String> = signature.tiers().iter().map(ToString::to_string).collect();
        return Err(EngineError::argument_shape(
            name,
            format!("{tier} arguments are not accepted (expects {})", accepted.join(" or ")),
        ));
    }

    match tier {
        Tier::Positional => {
            let pieces = positional_pieces(raw, signature);
            let kinds = (0..pieces.len())
                .map(|position| signature.kind_at(position))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    EngineError::argument_shape(
                        name,
                        format!(
                            "got {} positional arguments, expects at most {} ({})",
                            pieces.len(),
                            signature.positional_count(),
                            signature.describe_params()
                        ),
                    )
                })?;

            let mut values = Vec::with_capacity(pieces.len());
            for (piece, kind) in pieces.into_iter().zip(kinds) {
                let value = match kind {
                    ParamKind::Code => piece,
                    ParamKind::Value => stringify(&evaluate(&piece, ctx).await?),
                };
                values.push(value);
            }
            Ok(Arguments::Positional(values))
        }
        Tier::Named => {
            let pairs = dedup_last(parser::named_pairs(raw));
            let kinds = pairs
                .iter()
                .map(|(key, _)| declared_kind(name, key, signature))
                .collect::<EngineResult<Vec<_>>>()?;

            let mut values = HashMap::new();
            for ((key, piece), kind) in pairs.into_iter().zip(kinds) {
                let value = match kind {
                    ParamKind::Code => piece,
                    ParamKind::Value => stringify(&evaluate(&piece, ctx).await?),
                };
                values.insert(key, value);
            }
            Ok(Arguments::Named(values))
        }
        Tier::Literal => {
            let max_literal_depth = ctx.limits().max_literal_depth;
            parser::check_nesting(raw, max_literal_depth)?;
            let mut literal = parser::parse_literal(raw)?;
            parser::validate_depth(&literal, max_literal_depth)?;
            if let Value::Object(members) = &mut literal {
                let kinds = members
                    .keys()
                    .map(|key| declared_kind(name, key, signature))
                    .collect::<EngineResult<Vec<_>>>()?;
                for (member, kind) in members.values_mut().zip(kinds) {
                    if kind == ParamKind::Value {
                        evaluate_leaves(member, ctx).await?;
                    }
                }
            }
            Ok(Arguments::Literal(literal))
        }
    }
}

fn declared_kind(name: &str, key: &str, signature: &Signature) -> EngineResult<ParamKind> {
    signature.kind_of(key).ok_or_else(|| {
        EngineError::argument_shape(
            name,
            format!("unknown argument '{key}' (expects {})", signature.describe_params()),
        )
    })
}

/// Tier 1 pieces, with the greedy final parameter swallowing the remainder
fn positional_pieces(raw: &str, signature: &Signature) -> Vec<String> {
    let ranges = parser::positional_ranges(raw);
    let count = signature.positional_count();

    if signature.is_greedy() && count > 0 && ranges.len() > count {
        let mut pieces: Vec<String> = ranges[..count - 1]
            .iter()
            .map(|range| raw[range.clone()].to_string())
            .collect();
        let rest_start = ranges[count - 1].start;
        pieces.push(raw[rest_start..].trim_end().to_string());
        return pieces;
    }

    ranges.into_iter().map(|range| raw[range].to_string()).collect()
}

/// Evaluate the string leaves of a tier 3 value in place.
///
/// Only strings that could contain an invocation, a reference or an escape
/// are touched.
fn evaluate_leaves<'a>(
    value: &'a mut Value,
    ctx: &'a mut ExecutionContext,
) -> BoxFuture<'a, EngineResult<()>> {
    async move {
        let fragment = match value {
            Value::String(text) if text.contains(&['$', '\\'][..]) => Some(std::mem::take(text)),
            _ => None,
        };
        if let Some(fragment) = fragment {
            *value = evaluate(&fragment, ctx).await?;
            return Ok(());
        }

        match value {
            Value::Array(items) => {
                for item in items.iter_mut() {
                    evaluate_leaves(item, ctx).await?;
                }
            }
            Value::Object(members) => {
                for member in members.values_mut() {
                    evaluate_leaves(member, ctx).await?;
                }
            }
            _ => {}
        }
        Ok(())
    }
    .boxed()
}
