pub mod cli;
pub mod config;
pub mod executor;
pub mod parser;
pub mod store;

// Re-export main types
pub use config::{Config, EngineConfig};
pub use executor::{
    evaluate, Arguments, EngineError, EngineResult, ErrorContext, ExecutionContext, MacroHandler,
    ParamKind, Registry, Signature,
};
pub use store::{MemoryStore, VariableStore};
