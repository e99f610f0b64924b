//! Type definitions for the executor
//!
//! - Arguments handed to handlers (`Arguments`)
//! - Loop frames for the control-flow protocol (`LoopFrame`, `LoopKind`)
//! - Value helpers (stringification, truthiness)

pub mod args;
pub mod control;
pub mod values;

pub use args::Arguments;
pub use control::{LoopFrame, LoopKind};
pub use values::{is_truthy, stringify};
