//! Byte-level scanning shared by the locator and the argument parsers
//!
//! All structural characters of the charm grammar (`$ [ ] { } , ; : " \`) are
//! ASCII, so scanning bytes of a UTF-8 string never splits a character at a
//! reported position.

use std::ops::Range;

/* ===================== Character Classes ===================== */

pub fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

pub fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Characters that a backslash turns into plain text.
pub fn is_escapable(c: u8) -> bool {
    matches!(
        c,
        b'\\' | b'$' | b'[' | b']' | b'{' | b'}' | b',' | b';' | b':' | b'"'
    )
}

/* ===================== Top-Level Iteration ===================== */

/// Which bracket pairs open a nesting level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    /// Only `[` / `]` (invocation brackets)
    Brackets,
    /// `[` / `]` and `{` / `}` (argument structure)
    BracketsAndBraces,
}

/// Iterator over the bytes of a span that sit at depth 0, outside double
/// quotes and not escaped by a backslash.
///
/// Opening and closing brackets themselves are never yielded.
pub struct TopLevel<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    in_quote: bool,
    nesting: Nesting,
}

impl<'a> TopLevel<'a> {
    pub fn new(span: &'a str, nesting: Nesting) -> Self {
        Self {
            bytes: span.as_bytes(),
            pos: 0,
            depth: 0,
            in_quote: false,
            nesting,
        }
    }

    fn opens(&self, c: u8) -> bool {
        c == b'[' || (c == b'{' && self.nesting == Nesting::BracketsAndBraces)
    }

    fn closes(&self, c: u8) -> bool {
        c == b']' || (c == b'}' && self.nesting == Nesting::BracketsAndBraces)
    }
}

impl Iterator for TopLevel<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<(usize, u8)> {
        while self.pos < self.bytes.len() {
            let idx = self.pos;
            let c = self.bytes[idx];
            self.pos += 1;

            if c == b'\\' {
                self.pos += 1;
                continue;
            }

            if self.in_quote {
                if c == b'"' {
                    self.in_quote = false;
                }
                continue;
            }

            if c == b'"' {
                self.in_quote = true;
            } else if self.opens(c) {
                self.depth += 1;
            } else if self.closes(c) {
                self.depth = self.depth.saturating_sub(1);
            } else if self.depth == 0 {
                return Some((idx, c));
            }
        }
        None
    }
}

/// Split a span on any of `separators` found at the top level.
///
/// Returns the byte range of every piece, trimmed of surrounding whitespace.
pub fn split_top_level(span: &str, separators: &[u8]) -> Vec<Range<usize>> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for (idx, c) in TopLevel::new(span, Nesting::BracketsAndBraces) {
        if separators.contains(&c) {
            pieces.push(trimmed_range(span, start..idx));
            start = idx + 1;
        }
    }
    pieces.push(trimmed_range(span, start..span.len()));

    pieces
}

/// Position of the first top-level occurrence of `needle`
pub fn find_top_level(span: &str, needle: u8) -> Option<usize> {
    TopLevel::new(span, Nesting::BracketsAndBraces)
        .find(|&(_, c)| c == needle)
        .map(|(idx, _)| idx)
}

/// Narrow `range` so that it excludes leading and trailing whitespace
pub fn trimmed_range(span: &str, range: Range<usize>) -> Range<usize> {
    let piece = &span[range.clone()];
    let leading = piece.len() - piece.trim_start().len();
    let trailing = piece.len() - piece.trim_end().len();
    if leading == piece.len() {
        return range.start..range.start;
    }
    (range.start + leading)..(range.end - trailing)
}

/* ===================== Bracket Matching ===================== */

/// Find the `]` that closes the `[` at `open`.
///
/// Nested `[`/`]` pairs and double-quoted strings are skipped; a backslash
/// escapes the byte after it.
pub fn find_closing_bracket(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut pos = open;

    while pos < bytes.len() {
        let c = bytes[pos];
        match c {
            b'\\' => {
                pos += 2;
                continue;
            }
            b'"' => in_quote = !in_quote,
            b'[' if !in_quote => depth += 1,
            b']' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

/* ===================== Variable References ===================== */

/// Recognize a `$$ident(.segment)*` reference starting at `start`.
///
/// Returns the end offset of the reference and the dotted path without the
/// leading `$$`. Segments after the first may be purely numeric (array
/// indices). A trailing `.` that is not followed by a segment is not part of
/// the reference.
pub fn scan_variable(text: &str, start: usize) -> Option<(usize, &str)> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'$') || bytes.get(start + 1) != Some(&b'$') {
        return None;
    }

    let path_start = start + 2;
    if !bytes.get(path_start).copied().is_some_and(is_ident_start) {
        return None;
    }

    let mut end = path_start + 1;
    while bytes.get(end).copied().is_some_and(is_ident_char) {
        end += 1;
    }

    while bytes.get(end) == Some(&b'.') && bytes.get(end + 1).copied().is_some_and(is_ident_char) {
        end += 2;
        while bytes.get(end).copied().is_some_and(is_ident_char) {
            end += 1;
        }
    }

    Some((end, &text[path_start..end]))
}
