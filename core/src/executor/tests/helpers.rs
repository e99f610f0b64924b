//! Test helpers for executor tests
//!
//! A `Harness` bundles an execution context with its store and a call log
//! shared by the recording macros (`$rec`, `$outer`, `$inner`, `$echo`).

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::config::EngineConfig;
use crate::executor::{
    Arguments, EngineError, EngineResult, ExecutionContext, MacroHandler, ParamKind, Registry,
    Signature,
};
use crate::parser::Tier;
use crate::store::{MemoryStore, VariableStore};

/// Records `name(arg,arg)` on every call and returns its arguments joined by `,`
pub struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl MacroHandler for Recorder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn signature(&self) -> Signature {
        Signature::new(&[Tier::Positional]).rest(ParamKind::Value)
    }

    async fn execute(&self, args: Arguments, _ctx: &mut ExecutionContext) -> EngineResult<Value> {
        let pieces = match args {
            Arguments::Positional(pieces) => pieces,
            _ => Vec::new(),
        };
        let joined = pieces.join(",");
        self.log
            .lock()
            .unwrap()
            .push(format!("{}({})", self.name, joined));
        Ok(Value::String(joined))
    }
}

pub struct Harness {
    pub ctx: ExecutionContext,
    pub store: Arc<MemoryStore>,
    log: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_limits(EngineConfig::default())
    }

    pub fn with_limits(limits: EngineConfig) -> Self {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = Registry::with_stdlib();
        for name in ["rec", "outer", "inner", "echo"] {
            registry.register(Recorder {
                name,
                log: Arc::clone(&log),
            });
        }

        let store = Arc::new(MemoryStore::new());
        let ctx = ExecutionContext::new(Arc::new(registry), store.clone()).with_limits(limits);
        Self { ctx, store, log }
    }

    pub fn with_binding(mut self, name: &str, value: Value) -> Self {
        self.ctx = self.ctx.with_binding(name, value);
        self
    }

    pub async fn eval(&mut self, source: &str) -> Value {
        match self.ctx.evaluate(source).await {
            Ok(value) => value,
            Err(err) => panic!("Evaluation of {source:?} failed: {err:?}"),
        }
    }

    pub async fn eval_err(&mut self, source: &str) -> EngineError {
        match self.ctx.evaluate(source).await {
            Ok(value) => panic!("Expected {source:?} to fail, got {value:?}"),
            Err(err) => err,
        }
    }

    /// Calls recorded so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub async fn stored(&self, key: &str) -> Option<Value> {
        self.store.get(key).await.unwrap()
    }
}

/// Evaluate in a fresh harness
pub async fn eval(source: &str) -> Value {
    Harness::new().eval(source).await
}

/// Evaluate in a fresh harness, expecting an error
pub async fn eval_err(source: &str) -> EngineError {
    Harness::new().eval_err(source).await
}
