//! Engine error taxonomy

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/* ===================== Error Kinds ===================== */

pub const SYNTAX_ERROR: &str = "SyntaxError";
pub const ARGUMENT_SHAPE_ERROR: &str = "ArgumentShapeError";
pub const UNKNOWN_MACRO_ERROR: &str = "UnknownMacroError";
pub const INVALID_CONTROL_FLOW_ERROR: &str = "InvalidControlFlowError";
pub const LIMIT_EXCEEDED_ERROR: &str = "LimitExceededError";
pub const RUNTIME_ERROR: &str = "RuntimeError";

/* ===================== Error Context ===================== */

/// Snapshot of a failed evaluation, exposed to catch fragments as `$$error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub kind: String,
    pub message: String,
    /// Macro names that were executing when the error was raised, outermost first
    pub stack: Vec<String>,
    /// Source text whose evaluation failed
    pub source_fragment: String,
}

impl ErrorContext {
    /// Build a context for any engine error.
    ///
    /// Runtime errors already carry one and keep their original stack.
    pub fn from_error(error: &EngineError, source_fragment: &str, stack: &[String]) -> Self {
        match error {
            EngineError::Runtime(context) => (**context).clone(),
            other => ErrorContext {
                kind: other.kind().to_string(),
                message: other.to_string(),
                stack: stack.to_vec(),
                source_fragment: source_fragment.to_string(),
            },
        }
    }

    /// The `$$error` binding
    pub fn to_value(&self) -> Value {
        json!({
            "kind": self.kind,
            "message": self.message,
            "stack": self.stack.join(" > "),
            "source": self.source_fragment,
        })
    }
}

/* ===================== Engine Error ===================== */

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("${name}: {message}")]
    ArgumentShape { name: String, message: String },

    #[error("unknown macro ${name}")]
    UnknownMacro { name: String },

    #[error("${name}: {message}")]
    InvalidControlFlow { name: String, message: String },

    #[error("{message}")]
    LimitExceeded { message: String },

    /// Raised by a handler; wrapped into `Runtime` when it leaves dispatch
    #[error("{message}")]
    Domain { kind: String, message: String },

    #[error("{}", .0.message)]
    Runtime(Box<ErrorContext>),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        EngineError::Syntax {
            offset,
            message: message.into(),
        }
    }

    pub fn argument_shape(name: &str, message: impl Into<String>) -> Self {
        EngineError::ArgumentShape {
            name: name.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_control_flow(name: &str, message: impl Into<String>) -> Self {
        EngineError::InvalidControlFlow {
            name: name.to_string(),
            message: message.into(),
        }
    }

    pub fn limit_exceeded(message: impl Into<String>) -> Self {
        EngineError::LimitExceeded {
            message: message.into(),
        }
    }

    pub fn domain(kind: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Domain {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Taxonomy name of this error, e.g. `"SyntaxError"`
    pub fn kind(&self) -> &str {
        match self {
            EngineError::Syntax { .. } => SYNTAX_ERROR,
            EngineError::ArgumentShape { .. } => ARGUMENT_SHAPE_ERROR,
            EngineError::UnknownMacro { .. } => UNKNOWN_MACRO_ERROR,
            EngineError::InvalidControlFlow { .. } => INVALID_CONTROL_FLOW_ERROR,
            EngineError::LimitExceeded { .. } => LIMIT_EXCEEDED_ERROR,
            EngineError::Domain { kind, .. } => kind,
            EngineError::Runtime(context) => &context.kind,
        }
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::domain(RUNTIME_ERROR, format!("{err:#}"))
    }
}
