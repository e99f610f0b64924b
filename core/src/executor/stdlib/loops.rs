//! Loop macros: `$loop`, `$foreach`, `$break`, `$continue`
//!
//! Each loop pushes a `LoopFrame` for its lifetime and a fresh ambient scope
//! per iteration (`$$index`, `$$total`, and `$$value` for `$foreach`).
//! `$break` and `$continue` only flag the innermost frame; the loop and the
//! evaluator act on the flags.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use super::{parse_count, required};
use crate::executor::context::ExecutionContext;
use crate::executor::errors::{EngineError, EngineResult};
use crate::executor::registry::{MacroHandler, Signature};
use crate::executor::types::values::is_truthy_text;
use crate::executor::types::{stringify, Arguments, LoopFrame, LoopKind};
use crate::parser::Tier;

/* ===================== Loop Runner ===================== */

/// What one loop invocation iterates over
struct LoopPlan {
    kind: LoopKind,
    /// Per-iteration `$$value`, `None` for `$loop`
    items: Vec<Option<Value>>,
    code: String,
    parallel: bool,
    join: Option<String>,
}

impl LoopPlan {
    fn from_args(
        kind: LoopKind,
        items: Vec<Option<Value>>,
        args: &Arguments,
        ctx: &ExecutionContext,
    ) -> Self {
        let parallel = args
            .get_named("parallel")
            .map_or(ctx.limits().parallel_loops, |flag| is_truthy_text(&flag));
        Self {
            kind,
            items,
            code: args.get("code", 1).unwrap_or_default(),
            parallel,
            join: args.get_named("join"),
        }
    }

    async fn run(self, name: &str, ctx: &mut ExecutionContext) -> EngineResult<Value> {
        check_iterations(name, self.items.len(), ctx)?;

        debug!(
            loop_kind = ?self.kind,
            iterations = self.items.len(),
            parallel = self.parallel,
            "starting loop"
        );

        let results = if self.parallel {
            run_parallel(self.kind, self.items, &self.code, ctx).await?
        } else {
            run_sequential(self.kind, self.items, &self.code, ctx).await?
        };

        Ok(match self.join {
            Some(separator) => Value::String(
                results
                    .iter()
                    .map(stringify)
                    .collect::<Vec<_>>()
                    .join(&separator),
            ),
            None => Value::Array(results),
        })
    }
}

fn check_iterations(name: &str, count: usize, ctx: &ExecutionContext) -> EngineResult<()> {
    let limit = ctx.limits().max_iterations;
    if count > limit {
        return Err(EngineError::limit_exceeded(format!(
            "${name}: {count} iterations requested, limit is {limit}"
        )));
    }
    Ok(())
}

fn iteration_scope(index: usize, value: Option<&Value>, total: usize) -> HashMap<String, Value> {
    let mut scope = HashMap::from([
        ("index".to_string(), Value::from(index)),
        ("total".to_string(), Value::from(total)),
    ]);
    if let Some(value) = value {
        scope.insert("value".to_string(), value.clone());
    }
    scope
}

async fn run_sequential(
    kind: LoopKind,
    items: Vec<Option<Value>>,
    code: &str,
    ctx: &mut ExecutionContext,
) -> EngineResult<Vec<Value>> {
    let total = items.len();
    ctx.push_loop(LoopFrame::new(kind, total));

    let mut results = Vec::with_capacity(total);
    let mut outcome = Ok(());

    for (index, item) in items.into_iter().enumerate() {
        if let Some(frame) = ctx.current_loop_mut() {
            frame.begin_iteration(index, item.clone());
        }
        ctx.push_scope(iteration_scope(index, item.as_ref(), total));
        let body = ctx.evaluate(code).await;
        ctx.pop_scope();

        let value = match body {
            Ok(value) => value,
            Err(err) => {
                outcome = Err(err);
                break;
            }
        };

        if ctx.current_loop().is_some_and(|frame| frame.break_requested) {
            debug!(index, "loop break");
            break;
        }
        results.push(value);
    }

    ctx.pop_loop();
    outcome.map(|()| results)
}

/// Every iteration runs at once on its own forked context
async fn run_parallel(
    kind: LoopKind,
    items: Vec<Option<Value>>,
    code: &str,
    ctx: &mut ExecutionContext,
) -> EngineResult<Vec<Value>> {
    let total = items.len();

    let iterations: Vec<_> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let mut fork = ctx.fork();
            let mut frame = LoopFrame::new(kind, total);
            frame.begin_iteration(index, item.clone());
            fork.push_loop(frame);
            fork.push_scope(iteration_scope(index, item.as_ref(), total));

            async move {
                let value = fork.evaluate(code).await?;
                let broke = fork.current_loop().is_some_and(|frame| frame.break_requested);
                Ok::<_, EngineError>((!broke).then_some(value))
            }
        })
        .collect();

    let mut results = Vec::with_capacity(total);
    for outcome in join_all(iterations).await {
        if let Some(value) = outcome? {
            results.push(value);
        }
    }
    Ok(results)
}

/* ===================== $loop ===================== */

/// `$loop[times; code]`
pub struct Loop;

#[async_trait]
impl MacroHandler for Loop {
    fn name(&self) -> &'static str {
        "loop"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional, Tier::Named])
            .value("times")
            .code("code")
            .named_value("parallel")
            .named_value("join")
            .greedy()
    }

    fn summary(&self) -> &'static str {
        "run `code` a fixed number of times"
    }

    async fn execute(&self, args: Arguments, ctx: &mut ExecutionContext) -> EngineResult<Value> {
        let times = parse_count("loop", "times", &required(&args, "loop", "times", 0)?)?;
        check_iterations("loop", times, ctx)?;
        let items = vec![None; times];
        LoopPlan::from_args(LoopKind::Times, items, &args, ctx)
            .run("loop", ctx)
            .await
    }
}

/* ===================== $foreach ===================== */

/// `$foreach[items; code]`
///
/// Items may be an array value, the text of a JSON array, or a
/// comma-separated list.
pub struct ForEach;

fn collect_items(items: Value) -> Vec<Value> {
    match items {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        Value::String(text) => {
            let text = text.trim();
            if text.starts_with('[') {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
                    return items;
                }
            }
            text.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect()
        }
        other => vec![other],
    }
}

#[async_trait]
impl MacroHandler for ForEach {
    fn name(&self) -> &'static str {
        "foreach"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional, Tier::Named, Tier::Literal])
            .value("items")
            .code("code")
            .named_value("parallel")
            .named_value("join")
            .greedy()
    }

    fn summary(&self) -> &'static str {
        "run `code` once per item with $$index and $$value bound"
    }

    async fn execute(&self, args: Arguments, ctx: &mut ExecutionContext) -> EngineResult<Value> {
        let items = args.value("items", 0).ok_or_else(|| {
            EngineError::argument_shape("foreach", "missing required argument 'items'")
        })?;
        let items = collect_items(items).into_iter().map(Some).collect();
        LoopPlan::from_args(LoopKind::Array, items, &args, ctx)
            .run("foreach", ctx)
            .await
    }
}

/* ===================== $break / $continue ===================== */

pub struct Break;

#[async_trait]
impl MacroHandler for Break {
    fn name(&self) -> &'static str {
        "break"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional])
    }

    fn summary(&self) -> &'static str {
        "stop the innermost loop"
    }

    async fn execute(&self, _args: Arguments, ctx: &mut ExecutionContext) -> EngineResult<Value> {
        ctx.request_break("break")?;
        Ok(Value::Null)
    }
}

pub struct Continue;

#[async_trait]
impl MacroHandler for Continue {
    fn name(&self) -> &'static str {
        "continue"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional])
    }

    fn summary(&self) -> &'static str {
        "skip the rest of the current iteration"
    }

    async fn execute(&self, _args: Arguments, ctx: &mut ExecutionContext) -> EngineResult<Value> {
        ctx.request_continue("continue")?;
        Ok(Value::Null)
    }
}
