//! Loop frames for the control-flow protocol

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a loop iterates over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopKind {
    /// `$loop` - a fixed number of iterations
    Times,
    /// `$foreach` - the items of an array
    Array,
}

/// State of one active loop
///
/// `$break` and `$continue` set the flags of the current (innermost) frame;
/// the owning loop macro polls them after every body evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopFrame {
    pub kind: LoopKind,
    pub index: usize,
    pub value: Option<Value>,
    pub total: usize,
    pub break_requested: bool,
    pub continue_requested: bool,
}

impl LoopFrame {
    pub fn new(kind: LoopKind, total: usize) -> Self {
        Self {
            kind,
            index: 0,
            value: None,
            total,
            break_requested: false,
            continue_requested: false,
        }
    }

    /// Move to iteration `index`; a pending `continue` is consumed.
    pub fn begin_iteration(&mut self, index: usize, value: Option<Value>) {
        self.index = index;
        self.value = value;
        self.continue_requested = false;
    }

    /// True when either signal is waiting for the loop to act on it
    pub fn has_signal(&self) -> bool {
        self.break_requested || self.continue_requested
    }
}
