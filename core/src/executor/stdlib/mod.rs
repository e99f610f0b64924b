//! Built-in macros
//!
//! Control flow (`if`, `elseif`, `else`, `switch`, `loop`, `foreach`,
//! `break`, `continue`, `try`, `throw`) plus a handful of value macros
//! (`data`, `random`, `log`, `json`, `cond`).

pub mod conditions;
pub mod data;
pub mod loops;
pub mod try_catch;

use super::errors::{EngineError, EngineResult};
use super::registry::Registry;
use super::types::Arguments;

/// Install every built-in macro into `registry`
pub fn install(registry: &mut Registry) {
    registry.register(conditions::If);
    registry.register(conditions::ElseIf);
    registry.register(conditions::Else);
    registry.register(conditions::Switch);
    registry.register(conditions::Cond);

    registry.register(loops::Loop);
    registry.register(loops::ForEach);
    registry.register(loops::Break);
    registry.register(loops::Continue);

    registry.register(try_catch::Try);
    registry.register(try_catch::Throw);

    registry.register(data::Data);
    registry.register(data::Random);
    registry.register(data::Log);
    registry.register(data::Json);
}

/* ===================== Argument Helpers ===================== */

/// Fetch a parameter that must be present
pub(crate) fn required(
    args: &Arguments,
    macro_name: &str,
    param: &str,
    position: usize,
) -> EngineResult<String> {
    args.get(param, position).ok_or_else(|| {
        EngineError::argument_shape(macro_name, format!("missing required argument '{param}'"))
    })
}

/// Parse a non-negative integer argument
pub(crate) fn parse_count(macro_name: &str, param: &str, text: &str) -> EngineResult<usize> {
    text.trim().parse::<usize>().map_err(|_| {
        EngineError::argument_shape(
            macro_name,
            format!("argument '{param}' must be a non-negative integer, got \"{text}\""),
        )
    })
}
