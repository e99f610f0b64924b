//! Argument tier classification

use serde::{Deserialize, Serialize};
use std::fmt;

use super::scanner::find_top_level;

/// The three argument grammars a raw argument span can follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// `a, b; c`
    Positional,
    /// `key: value; other: value`
    Named,
    /// `{ "object": ["literal"] }`
    Literal,
}

impl Tier {
    pub fn number(self) -> u8 {
        match self {
            Tier::Positional => 1,
            Tier::Named => 2,
            Tier::Literal => 3,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}", self.number())
    }
}

/// Decide which grammar applies to `span`.
///
/// Only top-level characters count: a `:` or `{` belonging to a nested
/// invocation, a bracketed group or a quoted string never changes the tier.
/// A top-level colon anywhere (`10:30` included) selects the named grammar.
pub fn classify(span: &str) -> Tier {
    if span.trim_start().starts_with('{') {
        return Tier::Literal;
    }
    if find_top_level(span, b':').is_some() {
        return Tier::Named;
    }
    Tier::Positional
}
