//! Parsed arguments handed to macro handlers

use serde_json::Value;
use std::collections::HashMap;

use super::values::stringify;
use crate::parser::Tier;

/// Arguments of one invocation, after the engine has evaluated every
/// value-position parameter. Code-position parameters hold raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum Arguments {
    /// Tier 1: trimmed pieces in source order
    Positional(Vec<String>),
    /// Tier 2: key to trimmed value
    Named(HashMap<String, String>),
    /// Tier 3: structured literal
    Literal(Value),
}

impl Arguments {
    pub fn tier(&self) -> Tier {
        match self {
            Arguments::Positional(_) => Tier::Positional,
            Arguments::Named(_) => Tier::Named,
            Arguments::Literal(_) => Tier::Literal,
        }
    }

    /// Look up a parameter by position (tier 1) or by name (tiers 2 and 3),
    /// as text.
    pub fn get(&self, name: &str, position: usize) -> Option<String> {
        match self {
            Arguments::Positional(pieces) => pieces.get(position).cloned(),
            _ => self.get_named(name),
        }
    }

    /// Look up a parameter that can only be given by name.
    pub fn get_named(&self, name: &str) -> Option<String> {
        match self {
            Arguments::Positional(_) => None,
            Arguments::Named(map) => map.get(name).cloned(),
            Arguments::Literal(value) => value.get(name).map(stringify),
        }
    }

    /// Like `get`, but keeps tier 3 members structured.
    pub fn value(&self, name: &str, position: usize) -> Option<Value> {
        match self {
            Arguments::Literal(value) => value.get(name).cloned(),
            _ => self.get(name, position).map(Value::String),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Arguments::Positional(pieces) => pieces.len(),
            Arguments::Named(map) => map.len(),
            Arguments::Literal(Value::Object(members)) => members.len(),
            Arguments::Literal(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
