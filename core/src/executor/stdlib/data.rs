//! Value macros: `$data`, `$random`, `$log`, `$json`

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;

use super::required;
use crate::executor::context::ExecutionContext;
use crate::executor::errors::{EngineError, EngineResult};
use crate::executor::registry::{MacroHandler, ParamKind, Signature};
use crate::executor::types::Arguments;
use crate::parser::{self, Tier};

/* ===================== $data ===================== */

/// `$data[action; key; value]` - variable store access
///
/// | action | result |
/// |--------|--------|
/// | `get` | stored value, empty when absent |
/// | `set` | empty; `{...}` and `[...]` text is stored structured |
/// | `delete` | whether the key existed |
/// | `list` | sorted array of keys |
/// | `clear` | whether anything was removed |
pub struct Data;

/// Text as stored by `$data[set]`
fn stored_value(text: String) -> Value {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        if let Ok(value) = parser::parse_literal(trimmed) {
            return value;
        }
    } else if trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return value;
        }
    }
    Value::String(text)
}

#[async_trait]
impl MacroHandler for Data {
    fn name(&self) -> &'static str {
        "data"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional, Tier::Named])
            .value("action")
            .value("key")
            .value("value")
            .greedy()
    }

    fn summary(&self) -> &'static str {
        "get, set, delete, list or clear stored variables"
    }

    async fn execute(&self, args: Arguments, ctx: &mut ExecutionContext) -> EngineResult<Value> {
        let action = required(&args, "data", "action", 0)?.to_ascii_lowercase();
        let store = ctx.store();

        match action.as_str() {
            "get" => {
                let key = required(&args, "data", "key", 1)?;
                Ok(store.get(&key).await?.unwrap_or(Value::Null))
            }
            "set" => {
                let key = required(&args, "data", "key", 1)?;
                let value = stored_value(args.get("value", 2).unwrap_or_default());
                store.set(&key, value).await?;
                Ok(Value::Null)
            }
            "delete" => {
                let key = required(&args, "data", "key", 1)?;
                Ok(Value::Bool(store.delete(&key).await?))
            }
            "list" => {
                let keys = store.list().await?;
                Ok(Value::Array(keys.into_iter().map(Value::String).collect()))
            }
            "clear" => Ok(Value::Bool(store.clear().await?)),
            other => Err(EngineError::argument_shape(
                "data",
                format!("unknown action '{other}' (expected get, set, delete, list or clear)"),
            )),
        }
    }
}

/* ===================== $random ===================== */

/// `$random[min, max]` - integer in `[min, max]`
pub struct Random;

fn parse_bound(param: &str, text: &str) -> EngineResult<i64> {
    text.trim().parse::<i64>().map_err(|_| {
        EngineError::argument_shape(
            "random",
            format!("argument '{param}' must be an integer, got \"{text}\""),
        )
    })
}

#[async_trait]
impl MacroHandler for Random {
    fn name(&self) -> &'static str {
        "random"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional]).value("min").value("max")
    }

    fn summary(&self) -> &'static str {
        "random integer between min and max, inclusive"
    }

    async fn execute(&self, args: Arguments, _ctx: &mut ExecutionContext) -> EngineResult<Value> {
        let min = parse_bound("min", &required(&args, "random", "min", 0)?)?;
        let max = parse_bound("max", &required(&args, "random", "max", 1)?)?;
        if min > max {
            return Err(EngineError::argument_shape(
                "random",
                format!("min ({min}) is greater than max ({max})"),
            ));
        }
        Ok(Value::from(rand::thread_rng().gen_range(min..=max)))
    }
}

/* ===================== $log ===================== */

/// `$log[message]` or `$log[message: ...; level: warn]`
///
/// Writes through `tracing` under the `charm::script` target.
pub struct Log;

#[async_trait]
impl MacroHandler for Log {
    fn name(&self) -> &'static str {
        "log"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional, Tier::Named])
            .value("message")
            .named_value("level")
            .greedy()
    }

    fn summary(&self) -> &'static str {
        "write a message to the log"
    }

    async fn execute(&self, args: Arguments, _ctx: &mut ExecutionContext) -> EngineResult<Value> {
        let message = args.get("message", 0).unwrap_or_default();
        let level = args
            .get_named("level")
            .unwrap_or_else(|| "info".to_string())
            .to_ascii_lowercase();

        match level.as_str() {
            "trace" => tracing::trace!(target: "charm::script", "{message}"),
            "debug" => tracing::debug!(target: "charm::script", "{message}"),
            "info" => tracing::info!(target: "charm::script", "{message}"),
            "warn" | "warning" => tracing::warn!(target: "charm::script", "{message}"),
            "error" => tracing::error!(target: "charm::script", "{message}"),
            other => {
                return Err(EngineError::argument_shape(
                    "log",
                    format!("unknown level '{other}'"),
                ))
            }
        }
        Ok(Value::Null)
    }
}

/* ===================== $json ===================== */

/// `$json[{...}]` - the literal itself, with value leaves evaluated
pub struct Json;

#[async_trait]
impl MacroHandler for Json {
    fn name(&self) -> &'static str {
        "json"
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Literal]).rest(ParamKind::Value)
    }

    fn summary(&self) -> &'static str {
        "build a structured value from an object literal"
    }

    async fn execute(&self, args: Arguments, _ctx: &mut ExecutionContext) -> EngineResult<Value> {
        match args {
            Arguments::Literal(value) => Ok(value),
            _ => Ok(Value::Null),
        }
    }
}
