//! Per-request execution context
//!
//! One `ExecutionContext` is created for each piece of source text evaluated
//! at the top level (one command run, one event dispatch) and is passed by
//! `&mut` through every nested `evaluate` call. It owns the control-flow
//! state shared by the built-in macros: the loop stack, the last-condition
//! flag and the ambient binding scopes.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::errors::{EngineError, EngineResult};
use super::evaluator;
use super::registry::Registry;
use super::types::LoopFrame;
use crate::config::EngineConfig;
use crate::store::VariableStore;

pub struct ExecutionContext {
    registry: Arc<Registry>,
    store: Arc<dyn VariableStore>,
    limits: EngineConfig,

    /// Active loops, innermost last
    loop_stack: Vec<LoopFrame>,

    /// Outcome of the most recent condition in an if/elseif/else chain
    last_condition: Option<bool>,

    /// Ambient bindings, innermost last; index 0 holds caller bindings
    scopes: Vec<HashMap<String, Value>>,

    /// Names of the handlers currently executing, outermost first
    call_stack: Vec<String>,

    /// Invocations being bound or executed, checked against `max_depth`
    depth: usize,
}

impl ExecutionContext {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn VariableStore>) -> Self {
        Self {
            registry,
            store,
            limits: EngineConfig::default(),
            loop_stack: Vec::new(),
            last_condition: None,
            scopes: vec![HashMap::new()],
            call_stack: Vec::new(),
            depth: 0,
        }
    }

    pub fn with_limits(mut self, limits: EngineConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Add a caller-supplied ambient binding (visible as `$$name`)
    pub fn with_binding(mut self, name: impl Into<String>, value: Value) -> Self {
        self.scopes[0].insert(name.into(), value);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn VariableStore> {
        &self.store
    }

    pub fn limits(&self) -> &EngineConfig {
        &self.limits
    }

    /// Evaluate a fragment in this context
    pub async fn evaluate(&mut self, fragment: &str) -> EngineResult<Value> {
        evaluator::evaluate(fragment, self).await
    }

    /// A context for one parallel loop iteration.
    ///
    /// Shares the registry and store; copies bindings, flags and frames so the
    /// iteration can mutate them without affecting its siblings.
    pub fn fork(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            limits: self.limits.clone(),
            loop_stack: self.loop_stack.clone(),
            last_condition: self.last_condition,
            scopes: self.scopes.clone(),
            call_stack: self.call_stack.clone(),
            depth: self.depth,
        }
    }

    /* ===================== Conditions ===================== */

    pub fn last_condition(&self) -> Option<bool> {
        self.last_condition
    }

    pub fn set_last_condition(&mut self, outcome: Option<bool>) {
        self.last_condition = outcome;
    }

    /* ===================== Loops ===================== */

    pub fn push_loop(&mut self, frame: LoopFrame) {
        self.loop_stack.push(frame);
    }

    pub fn pop_loop(&mut self) -> Option<LoopFrame> {
        self.loop_stack.pop()
    }

    pub fn current_loop(&self) -> Option<&LoopFrame> {
        self.loop_stack.last()
    }

    pub fn current_loop_mut(&mut self) -> Option<&mut LoopFrame> {
        self.loop_stack.last_mut()
    }

    pub fn loop_depth(&self) -> usize {
        self.loop_stack.len()
    }

    /// Ask the innermost loop to stop after the current iteration
    pub fn request_break(&mut self, name: &str) -> EngineResult<()> {
        let frame = self.current_loop_mut().ok_or_else(|| {
            EngineError::invalid_control_flow(name, "used outside of a loop")
        })?;
        frame.break_requested = true;
        Ok(())
    }

    /// Ask the innermost loop to skip the rest of the current iteration
    pub fn request_continue(&mut self, name: &str) -> EngineResult<()> {
        let frame = self.current_loop_mut().ok_or_else(|| {
            EngineError::invalid_control_flow(name, "used outside of a loop")
        })?;
        frame.continue_requested = true;
        Ok(())
    }

    /// Whether the innermost loop has a break or continue waiting
    pub fn pending_signal(&self) -> bool {
        self.current_loop().is_some_and(LoopFrame::has_signal)
    }

    /* ===================== Bindings ===================== */

    pub fn push_scope(&mut self, bindings: HashMap<String, Value>) {
        self.scopes.push(bindings);
    }

    /// Pop the innermost scope; the caller scope is never removed
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Innermost ambient binding for `name`
    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /* ===================== Call Stack ===================== */

    pub fn call_stack(&self) -> &[String] {
        &self.call_stack
    }

    /// Number of invocations currently being bound or executed
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Start binding an invocation. Nested value arguments are bound inside
    /// their parent, so they count towards the same limit.
    pub(crate) fn descend(&mut self, name: &str) -> EngineResult<()> {
        if self.depth >= self.limits.max_depth {
            return Err(EngineError::limit_exceeded(format!(
                "${name}: nesting deeper than {} invocations",
                self.limits.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn enter(&mut self, name: &str) {
        self.call_stack.push(name.to_string());
    }

    pub(crate) fn leave(&mut self) {
        self.call_stack.pop();
    }
}
