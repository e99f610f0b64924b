//! `$try` and `$throw`

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::executor::context::ExecutionContext;
use crate::executor::errors::{EngineError, EngineResult, ErrorContext};
use crate::executor::registry::{MacroHandler, Signature};
use crate::executor::types::Arguments;
use crate::parser::Tier;

/// Kind used by `$throw` when none is given
pub const THROWN_ERROR: &str = "CustomError";

/// `$try[code; catch; finally]`
///
/// On failure the catch fragment sees the error as `$$error` (with `kind`,
/// `message`, `stack` and `source` members). `finally` always runs. Without
/// a catch fragment the error is raised again once `finally` is done.
pub struct Try;

#[async_trait]
impl MacroHandler for Try {
    fn name(&self) -> &'static str {
        "try"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional, Tier::Named])
            .code("code")
            .code("catch")
            .code("finally")
    }

    fn summary(&self) -> &'static str {
        "run `code`, handing failures to `catch`; `finally` always runs"
    }

    async fn execute(&self, args: Arguments, ctx: &mut ExecutionContext) -> EngineResult<Value> {
        let code = args.get("code", 0).unwrap_or_default();
        let catch = args.get("catch", 1);
        let finally = args.get("finally", 2);

        let error = match ctx.evaluate(&code).await {
            Ok(value) => {
                return match finally {
                    Some(finally) => ctx.evaluate(&finally).await,
                    None => Ok(value),
                };
            }
            Err(error) => error,
        };

        let context = ErrorContext::from_error(&error, &code, ctx.call_stack());
        debug!(kind = %context.kind, message = %context.message, "caught error");

        let caught = match &catch {
            Some(catch) => {
                ctx.push_scope(HashMap::from([("error".to_string(), context.to_value())]));
                let result = ctx.evaluate(catch).await;
                ctx.pop_scope();
                Some(result)
            }
            None => None,
        };

        if let Some(finally) = finally {
            ctx.evaluate(&finally).await?;
        }

        match caught {
            Some(result) => result,
            None => Err(error),
        }
    }
}

/// `$throw[message]` or `$throw[message: ...; kind: ...]`
pub struct Throw;

#[async_trait]
impl MacroHandler for Throw {
    fn name(&self) -> &'static str {
        "throw"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional, Tier::Named])
            .value("message")
            .named_value("kind")
            .greedy()
    }

    fn summary(&self) -> &'static str {
        "raise an error that $try can catch"
    }

    async fn execute(&self, args: Arguments, _ctx: &mut ExecutionContext) -> EngineResult<Value> {
        let message = args.get("message", 0).unwrap_or_default();
        let kind = args
            .get_named("kind")
            .filter(|kind| !kind.is_empty())
            .unwrap_or_else(|| THROWN_ERROR.to_string());
        Err(EngineError::domain(kind, message))
    }
}
