//! Conditional macros: `$if`, `$elseif`, `$else`, `$switch`, `$cond`
//!
//! `$if` records its outcome in the context's last-condition flag; `$elseif`
//! and `$else` read it to decide whether they run. The chain is linear and
//! left to right, and any later `$if` starts a new one.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use super::required;
use crate::executor::context::ExecutionContext;
use crate::executor::errors::{EngineError, EngineResult};
use crate::executor::registry::{MacroHandler, ParamKind, Signature};
use crate::executor::types::values::{is_truthy, is_truthy_text};
use crate::executor::types::{stringify, Arguments};
use crate::parser::Tier;

/* ===================== Condition Expressions ===================== */

const COMPARISONS: [&str; 6] = ["==", "!=", ">=", "<=", ">", "<"];

/// Decide a condition value.
///
/// Text may hold comparisons (`==`, `!=`, `>=`, `<=`, `>`, `<`) joined by
/// `&&` and `||`, with `&&` binding tighter. A term with no comparison is
/// tested for truthiness; a leading `!` negates it. Operands compare as
/// numbers when both sides parse as numbers.
pub fn condition_holds(value: &Value) -> bool {
    match value {
        Value::String(text) => text_condition_holds(text),
        other => is_truthy(other),
    }
}

pub fn text_condition_holds(text: &str) -> bool {
    split_outside_quotes(text, "||")
        .into_iter()
        .any(|clause| {
            split_outside_quotes(clause, "&&")
                .into_iter()
                .all(term_holds)
        })
}

fn term_holds(term: &str) -> bool {
    let term = term.trim();

    if let Some((lhs, op, rhs)) = find_comparison(term) {
        return compare(unquote(lhs), op, unquote(rhs));
    }

    match term.strip_prefix('!') {
        Some(negated) => !term_holds(negated),
        None => is_truthy_text(unquote(term)),
    }
}

fn compare(lhs: &str, op: &str, rhs: &str) -> bool {
    if let (Ok(a), Ok(b)) = (lhs.parse::<f64>(), rhs.parse::<f64>()) {
        return match op {
            "==" => a == b,
            "!=" => a != b,
            ">=" => a >= b,
            "<=" => a <= b,
            ">" => a > b,
            _ => a < b,
        };
    }
    match op {
        "==" => lhs == rhs,
        "!=" => lhs != rhs,
        ">=" => lhs >= rhs,
        "<=" => lhs <= rhs,
        ">" => lhs > rhs,
        _ => lhs < rhs,
    }
}

/// First comparison operator outside double quotes
fn find_comparison(term: &str) -> Option<(&str, &'static str, &str)> {
    let mut in_quote = false;
    for (idx, c) in term.char_indices() {
        if c == '"' {
            in_quote = !in_quote;
            continue;
        }
        if in_quote {
            continue;
        }
        for op in COMPARISONS {
            if term[idx..].starts_with(op) {
                return Some((term[..idx].trim(), op, term[idx + op.len()..].trim()));
            }
        }
    }
    None
}

fn split_outside_quotes<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut in_quote = false;
    let mut start = 0;
    let mut idx = 0;

    let bytes = text.as_bytes();

    while idx < bytes.len() {
        if bytes[idx] == b'"' {
            in_quote = !in_quote;
        } else if !in_quote && bytes[idx..].starts_with(separator.as_bytes()) {
            parts.push(&text[start..idx]);
            idx += separator.len();
            start = idx;
            continue;
        }
        idx += 1;
    }
    parts.push(&text[start..]);
    parts
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/* ===================== $if ===================== */

/// `$if[condition; then; else]`
pub struct If;

#[async_trait]
impl MacroHandler for If {
    fn name(&self) -> &'static str {
        "if"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional, Tier::Named])
            .value("condition")
            .code("then")
            .code("else")
    }

    fn summary(&self) -> &'static str {
        "run `then` when the condition holds, `else` otherwise"
    }

    async fn execute(&self, args: Arguments, ctx: &mut ExecutionContext) -> EngineResult<Value> {
        let condition = required(&args, "if", "condition", 0)?;
        let outcome = text_condition_holds(&condition);
        ctx.set_last_condition(Some(outcome));

        let branch = if outcome {
            args.get("then", 1)
        } else {
            args.get("else", 2)
        };
        let result = match branch {
            Some(code) => ctx.evaluate(&code).await?,
            None => Value::Null,
        };

        // A chain nested inside the branch must not leak into this one
        ctx.set_last_condition(Some(outcome));
        Ok(result)
    }
}

/* ===================== $elseif ===================== */

/// `$elseif[condition; then]`
///
/// The condition is a code parameter: it is only evaluated when every earlier
/// condition of the chain was false.
pub struct ElseIf;

#[async_trait]
impl MacroHandler for ElseIf {
    fn name(&self) -> &'static str {
        "elseif"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional, Tier::Named])
            .code("condition")
            .code("then")
            .greedy()
    }

    fn summary(&self) -> &'static str {
        "continue an $if chain whose conditions were all false"
    }

    async fn execute(&self, args: Arguments, ctx: &mut ExecutionContext) -> EngineResult<Value> {
        match ctx.last_condition() {
            None => Err(EngineError::invalid_control_flow(
                "elseif",
                "no preceding $if in this chain",
            )),
            Some(true) => Ok(Value::Null),
            Some(false) => {
                let condition = required(&args, "elseif", "condition", 0)?;
                let outcome = condition_holds(&ctx.evaluate(&condition).await?);
                ctx.set_last_condition(Some(outcome));
                if !outcome {
                    return Ok(Value::Null);
                }

                let result = match args.get("then", 1) {
                    Some(code) => ctx.evaluate(&code).await?,
                    None => Value::Null,
                };
                ctx.set_last_condition(Some(outcome));
                Ok(result)
            }
        }
    }
}

/* ===================== $else ===================== */

/// `$else[code]` - ends the chain
pub struct Else;

#[async_trait]
impl MacroHandler for Else {
    fn name(&self) -> &'static str {
        "else"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional, Tier::Named])
            .code("code")
            .greedy()
    }

    fn summary(&self) -> &'static str {
        "run when every condition of the $if chain was false"
    }

    async fn execute(&self, args: Arguments, ctx: &mut ExecutionContext) -> EngineResult<Value> {
        let previous = ctx.last_condition().ok_or_else(|| {
            EngineError::invalid_control_flow("else", "no preceding $if in this chain")
        })?;
        ctx.set_last_condition(None);

        if previous {
            return Ok(Value::Null);
        }
        match args.get("code", 0) {
            Some(code) => ctx.evaluate(&code).await,
            None => Ok(Value::Null),
        }
    }
}

/* ===================== $switch ===================== */

/// `$switch[value: x; case: code; default: code]` or
/// `$switch[{"value": x, "cases": {"case": "code"}}]`
pub struct Switch;

#[async_trait]
impl MacroHandler for Switch {
    fn name(&self) -> &'static str {
        "switch"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Named, Tier::Literal])
            .value("value")
            .rest(ParamKind::Code)
    }

    fn summary(&self) -> &'static str {
        "run the case whose key equals the value, else `default`"
    }

    async fn execute(&self, args: Arguments, ctx: &mut ExecutionContext) -> EngineResult<Value> {
        let discriminant = args.get_named("value").ok_or_else(|| {
            EngineError::argument_shape("switch", "missing required argument 'value'")
        })?;

        let cases: HashMap<String, String> = match args {
            Arguments::Named(mut map) => {
                map.remove("value");
                map
            }
            Arguments::Literal(literal) => match literal.get("cases") {
                Some(Value::Object(members)) => members
                    .iter()
                    .map(|(key, code)| (key.clone(), stringify(code)))
                    .collect(),
                Some(_) => {
                    return Err(EngineError::argument_shape(
                        "switch",
                        "'cases' must be an object",
                    ))
                }
                None => HashMap::new(),
            },
            Arguments::Positional(_) => HashMap::new(),
        };

        match cases.get(&discriminant).or_else(|| cases.get("default")) {
            Some(code) => ctx.evaluate(code).await,
            None => Ok(Value::Null),
        }
    }
}

/* ===================== $cond ===================== */

/// `$cond[expression]` - the condition outcome as a boolean
pub struct Cond;

#[async_trait]
impl MacroHandler for Cond {
    fn name(&self) -> &'static str {
        "cond"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional]).value("condition").greedy()
    }

    fn summary(&self) -> &'static str {
        "evaluate a condition to true or false"
    }

    async fn execute(&self, args: Arguments, _ctx: &mut ExecutionContext) -> EngineResult<Value> {
        let condition = args.get("condition", 0).unwrap_or_default();
        Ok(Value::Bool(text_condition_holds(&condition)))
    }
}
