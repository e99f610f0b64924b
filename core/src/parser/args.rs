//! Tier 1 and tier 2 argument splitting
//!
//! Splitting never evaluates anything: nested invocations, quoted strings and
//! `$$` references stay verbatim inside the pieces.

use std::collections::HashMap;
use std::ops::Range;

use super::scanner::{find_top_level, split_top_level};

/* ===================== Tier 1 ===================== */

/// Split a positional span on top-level `,` or `;`, trimming every piece.
///
/// An empty or all-whitespace span has no arguments.
pub fn split_positional(span: &str) -> Vec<String> {
    positional_ranges(span)
        .into_iter()
        .map(|range| span[range].to_string())
        .collect()
}

/// Byte ranges of the trimmed positional pieces of `span`
pub fn positional_ranges(span: &str) -> Vec<Range<usize>> {
    if span.trim().is_empty() {
        return Vec::new();
    }
    split_top_level(span, b",;")
}

/* ===================== Tier 2 ===================== */

/// Split a named span into `key: value` pairs, in source order.
///
/// Pieces are separated by top-level `;` and divided at their first
/// top-level `:`. Pieces without a colon are dropped. Duplicate keys are
/// kept here; callers decide how to collapse them.
pub fn named_pairs(span: &str) -> Vec<(String, String)> {
    split_top_level(span, b";")
        .into_iter()
        .filter_map(|range| {
            let piece = &span[range];
            let colon = find_top_level(piece, b':')?;
            let key = piece[..colon].trim();
            let value = piece[colon + 1..].trim();
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Split a named span into a mapping; the last occurrence of a key wins.
pub fn split_named(span: &str) -> HashMap<String, String> {
    named_pairs(span).into_iter().collect()
}

/// Drop all but the last occurrence of every key, keeping source order.
pub fn dedup_last(pairs: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut last_index: HashMap<&str, usize> = HashMap::new();
    for (idx, (key, _)) in pairs.iter().enumerate() {
        last_index.insert(key.as_str(), idx);
    }
    let keep: Vec<usize> = {
        let mut indices: Vec<usize> = last_index.into_values().collect();
        indices.sort_unstable();
        indices
    };

    let mut pairs: Vec<Option<(String, String)>> = pairs.into_iter().map(Some).collect();
    keep.into_iter().filter_map(|idx| pairs[idx].take()).collect()
}
