//! Charm evaluation engine
//!
//! - `evaluator`: walks fragments and dispatches invocations
//! - `resolver`: `$$path` lookup and text interpolation
//! - `registry`: handler trait, signatures and the name table
//! - `context`: per-request control-flow state
//! - `stdlib`: built-in macros

pub mod context;
pub mod errors;
pub mod evaluator;
pub mod registry;
pub mod resolver;
pub mod stdlib;
pub mod types;

#[cfg(test)]
mod tests;

pub use context::ExecutionContext;
pub use errors::{EngineError, EngineResult, ErrorContext};
pub use evaluator::evaluate;
pub use registry::{MacroHandler, ParamKind, Registry, Signature};
pub use types::{Arguments, LoopFrame, LoopKind};
