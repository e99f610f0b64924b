//! Macro handler registry
//!
//! Every macro is a `MacroHandler` registered under a unique lowercase name.
//! A handler's `Signature` tells the evaluator which tiers it accepts and,
//! per parameter, whether the argument is a value (evaluated before dispatch)
//! or code (passed through as raw text for the handler to evaluate later).
//! Arguments a signature does not declare are rejected unless it sets
//! `rest(...)`.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::context::ExecutionContext;
use super::errors::EngineResult;
use super::types::Arguments;
use crate::parser::Tier;

/* ===================== Signatures ===================== */

/// Evaluation strategy of one parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Evaluated by the engine before the handler runs
    Value,
    /// Passed as raw text; only the handler may evaluate it
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    /// Whether the parameter can be given positionally in tier 1
    pub positional: bool,
}

/// Declared shape of a macro's arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    tiers: Vec<Tier>,
    params: Vec<Param>,
    rest: Option<ParamKind>,
    greedy: bool,
}

impl Signature {
    pub fn new(tiers: &[Tier]) -> Self {
        Self {
            tiers: tiers.to_vec(),
            params: Vec::new(),
            rest: None,
            greedy: false,
        }
    }

    /// Positional or named value parameter
    pub fn value(self, name: &'static str) -> Self {
        self.param(name, ParamKind::Value, true)
    }

    /// Positional or named code parameter
    pub fn code(self, name: &'static str) -> Self {
        self.param(name, ParamKind::Code, true)
    }

    /// Value parameter that tier 1 cannot reach
    pub fn named_value(self, name: &'static str) -> Self {
        self.param(name, ParamKind::Value, false)
    }

    fn param(mut self, name: &'static str, kind: ParamKind, positional: bool) -> Self {
        self.params.push(Param {
            name,
            kind,
            positional,
        });
        self
    }

    /// Accept parameters the signature does not declare, binding them as `kind`
    pub fn rest(mut self, kind: ParamKind) -> Self {
        self.rest = Some(kind);
        self
    }

    /// In tier 1, the last positional parameter takes the rest of the span,
    /// separators included.
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    pub fn accepts(&self, tier: Tier) -> bool {
        self.tiers.contains(&tier)
    }

    pub fn positional_count(&self) -> usize {
        self.params.iter().filter(|p| p.positional).count()
    }

    /// Kind of the tier 1 argument at `position`, `None` when it is not accepted
    pub fn kind_at(&self, position: usize) -> Option<ParamKind> {
        self.params
            .iter()
            .filter(|p| p.positional)
            .nth(position)
            .map(|p| p.kind)
            .or(self.rest)
    }

    /// Kind of the tier 2 / tier 3 argument called `name`, `None` when it is
    /// not accepted
    pub fn kind_of(&self, name: &str) -> Option<ParamKind> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.kind)
            .or(self.rest)
    }

    /// Comma-separated parameter names, for diagnostics
    pub fn describe_params(&self) -> String {
        let names: Vec<&str> = self.params.iter().map(|p| p.name).collect();
        if names.is_empty() {
            "no arguments".to_string()
        } else {
            names.join(", ")
        }
    }
}

/* ===================== Handler Trait ===================== */

#[async_trait]
pub trait MacroHandler: Send + Sync {
    /// Unique lowercase name, without the `$`
    fn name(&self) -> &'static str;

    fn signature(&self) -> Signature;

    /// One-line description for `charm macros`
    fn summary(&self) -> &'static str {
        ""
    }

    async fn execute(&self, args: Arguments, ctx: &mut ExecutionContext) -> EngineResult<Value>;
}

/* ===================== Registry ===================== */

#[derive(Clone, Default)]
pub struct Registry {
    handlers: HashMap<String, Arc<dyn MacroHandler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in macro installed
    pub fn with_stdlib() -> Self {
        let mut registry = Self::new();
        super::stdlib::install(&mut registry);
        registry
    }

    /// Register a handler; an existing handler with the same name is replaced.
    pub fn register<H: MacroHandler + 'static>(&mut self, handler: H) {
        let name = handler.name().to_ascii_lowercase();
        if self.handlers.insert(name.clone(), Arc::new(handler)).is_some() {
            tracing::warn!(macro_name = %name, "replaced existing macro handler");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn MacroHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
