//! Charm source parsing
//!
//! Everything here is pure text processing: locating `$name[...]`
//! invocations, classifying argument spans into tiers, and splitting or
//! parsing them. Nothing in this module evaluates.
//!
//! ## Tiers
//!
//! | Tier | Shape | Example |
//! |------|-------|---------|
//! | 1 | positional, `,` or `;` separated | `$random[1, 10]` |
//! | 2 | named, `;` separated `key: value` | `$if[condition: $$x == 1; then: yes]` |
//! | 3 | object literal | `$foreach[{"items": [1, 2], "code": "$$value"}]` |

pub mod args;
pub mod literal;
pub mod locator;
pub mod scanner;
pub mod tier;

#[cfg(test)]
mod tests;

pub use args::{named_pairs, positional_ranges, split_named, split_positional};
pub use literal::{check_nesting, parse_literal, validate_depth};
pub use locator::{find_all, find_next, Invocation};
pub use tier::{classify, Tier};
