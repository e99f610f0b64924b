//! Invocation locator
//!
//! Finds the next `$name[...]` span in a piece of text. The scan is
//! depth-aware and quote-aware, so a `]` inside a string literal or inside a
//! nested invocation never closes the outer one.

use std::ops::Range;

use super::scanner::{find_closing_bracket, is_ident_char, is_ident_start, scan_variable};
use crate::executor::errors::EngineError;

/// One `$name[...]` occurrence in a scanned text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Macro name, lowercased
    pub name: String,
    /// Text between the brackets, verbatim
    pub raw_args: String,
    /// Byte range of the whole invocation, `$` through `]`
    pub span: Range<usize>,
    /// Byte range of `raw_args`
    pub args_span: Range<usize>,
}

/// Find the first invocation at or after `from`.
///
/// `$$path` variable references and `\$` escapes are skipped. A `$` directly
/// preceded by an identifier character is plain text, and a name is always
/// taken as the complete identifier up to `[`.
///
/// # Errors
/// `EngineError::Syntax` when an invocation's `[` has no matching `]`; the
/// offset points at the invocation's `$`.
pub fn find_next(text: &str, from: usize) -> Result<Option<Invocation>, EngineError> {
    let bytes = text.as_bytes();
    let mut pos = from;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'$' => {
                if let Some((end, _)) = scan_variable(text, pos) {
                    pos = end;
                    continue;
                }
                if bytes.get(pos + 1) == Some(&b'$') {
                    // A bare `$$` is text; the second `$` may still start an invocation
                    pos += 1;
                    continue;
                }
                if pos > 0 && is_ident_char(bytes[pos - 1]) {
                    pos += 1;
                    continue;
                }

                let name_start = pos + 1;
                if !bytes.get(name_start).copied().is_some_and(is_ident_start) {
                    pos += 1;
                    continue;
                }
                let mut name_end = name_start + 1;
                while bytes.get(name_end).copied().is_some_and(is_ident_char) {
                    name_end += 1;
                }

                if bytes.get(name_end) != Some(&b'[') {
                    pos = name_end;
                    continue;
                }

                let name = &text[name_start..name_end];
                let close = find_closing_bracket(bytes, name_end).ok_or_else(|| {
                    EngineError::syntax(pos, format!("unterminated invocation of ${name}"))
                })?;

                return Ok(Some(Invocation {
                    name: name.to_ascii_lowercase(),
                    raw_args: text[name_end + 1..close].to_string(),
                    span: pos..close + 1,
                    args_span: name_end + 1..close,
                }));
            }
            _ => pos += 1,
        }
    }

    Ok(None)
}

/// Collect every top-level invocation in `text`, left to right.
///
/// Nested invocations stay inside their parent's `raw_args`.
pub fn find_all(text: &str) -> Result<Vec<Invocation>, EngineError> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some(invocation) = find_next(text, cursor)? {
        cursor = invocation.span.end;
        found.push(invocation);
    }
    Ok(found)
}
