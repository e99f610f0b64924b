//! Variable resolution
//!
//! `$$name(.segment)*` references are looked up in the ambient bindings of the
//! context first (innermost scope wins), then in the variable store. Dotted
//! segments walk into objects by key and into arrays by index. A path that
//! leads nowhere resolves to the empty string.

use serde_json::Value;

use super::context::ExecutionContext;
use super::errors::EngineResult;
use super::types::stringify;
use crate::parser::scanner::{is_escapable, scan_variable};

/// Look up a dotted path such as `user.roles.0`.
///
/// A store failure is an error; an absent variable or segment is `None`.
pub async fn lookup(path: &str, ctx: &ExecutionContext) -> EngineResult<Option<Value>> {
    let mut segments = path.split('.');
    let Some(root) = segments.next() else {
        return Ok(None);
    };

    let root_value = match ctx.binding(root) {
        Some(value) => Some(value.clone()),
        None => ctx.store().get(root).await?,
    };

    let Some(mut current) = root_value else {
        tracing::trace!(variable = %path, "unresolved variable");
        return Ok(None);
    };

    for segment in segments {
        let next = match &current {
            Value::Object(members) => members.get(segment).cloned(),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => {
                tracing::trace!(variable = %path, segment, "unresolved path segment");
                return Ok(None);
            }
        }
    }

    Ok(Some(current))
}

/// If `fragment` is exactly one `$$path` reference, return the path.
pub fn sole_variable(fragment: &str) -> Option<&str> {
    match scan_variable(fragment, 0) {
        Some((end, path)) if end == fragment.len() => Some(path),
        _ => None,
    }
}

/// Expand plain text: substitute `$$` references and drop the backslash of
/// escaped structural characters.
pub async fn resolve_text(text: &str, ctx: &ExecutionContext) -> EngineResult<String> {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' if bytes.get(pos + 1).copied().is_some_and(is_escapable) => {
                out.push_str(&text[literal_start..pos]);
                literal_start = pos + 1;
                pos += 2;
            }
            b'$' => match scan_variable(text, pos) {
                Some((end, path)) => {
                    out.push_str(&text[literal_start..pos]);
                    if let Some(value) = lookup(path, ctx).await? {
                        out.push_str(&stringify(&value));
                    }
                    literal_start = end;
                    pos = end;
                }
                None => pos += 1,
            },
            _ => pos += 1,
        }
    }
    out.push_str(&text[literal_start..]);

    Ok(out)
}
