//! Tier 3 literal parser - PEST-based
//!
//! Produces `serde_json::Value` trees. String contents are kept verbatim
//! (after JSON unescaping), including any `$name[...]` text they contain.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use serde_json::{Map, Number, Value};

use crate::executor::errors::EngineError;

#[derive(Parser)]
#[grammar = "parser/literal.pest"]
struct LiteralParser;

/* ===================== Public API ===================== */

/// Parse a tier 3 object or array literal.
///
/// # Errors
/// `EngineError::Syntax` carrying the PEST diagnostic and the byte offset
/// where parsing failed.
pub fn parse_literal(span: &str) -> Result<Value, EngineError> {
    let mut pairs = LiteralParser::parse(Rule::literal, span).map_err(|err| {
        let offset = match err.location {
            pest::error::InputLocation::Pos(pos) => pos,
            pest::error::InputLocation::Span((start, _)) => start,
        };
        EngineError::syntax(offset, err.to_string())
    })?;

    // literal = { SOI ~ value ~ EOI }
    let value = pairs
        .next()
        .and_then(|literal| literal.into_inner().next())
        .ok_or_else(|| EngineError::syntax(0, "empty literal"))?;

    build_value(value)
}

/// Reject literals nested deeper than `max_depth` levels.
pub fn validate_depth(value: &Value, max_depth: usize) -> Result<(), EngineError> {
    fn depth(value: &Value) -> usize {
        match value {
            Value::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
            Value::Object(members) => 1 + members.values().map(depth).max().unwrap_or(0),
            _ => 0,
        }
    }

    let found = depth(value);
    if found > max_depth {
        return Err(EngineError::syntax(
            0,
            format!("literal nests {found} levels deep, limit is {max_depth}"),
        ));
    }
    Ok(())
}

/// Reject a literal span whose brackets nest deeper than `max_depth`,
/// before the recursive grammar sees it.
pub fn check_nesting(span: &str, max_depth: usize) -> Result<(), EngineError> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in span.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > max_depth {
                    return Err(EngineError::syntax(
                        offset,
                        format!("literal nests deeper than {max_depth} levels"),
                    ));
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/* ===================== Value Builder ===================== */

fn build_value(pair: Pair<Rule>) -> Result<Value, EngineError> {
    let offset = pair.as_span().start();

    match pair.as_rule() {
        Rule::object => {
            let mut members = Map::new();
            for member in pair.into_inner() {
                // pair = { key ~ ":" ~ value }
                let mut inner = member.into_inner();
                let (Some(key), Some(value)) = (inner.next(), inner.next()) else {
                    return Err(EngineError::syntax(offset, "incomplete object member"));
                };
                let key = match key.as_rule() {
                    Rule::string => unescape(string_inner(key)),
                    _ => key.as_str().to_string(),
                };
                members.insert(key, build_value(value)?);
            }
            Ok(Value::Object(members))
        }
        Rule::array => pair
            .into_inner()
            .map(build_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Rule::string => Ok(Value::String(unescape(string_inner(pair)))),
        Rule::number => build_number(pair.as_str(), offset),
        Rule::boolean => Ok(Value::Bool(pair.as_str() == "true")),
        Rule::null_lit => Ok(Value::Null),
        rule => Err(EngineError::syntax(
            offset,
            format!("unexpected {rule:?} in literal"),
        )),
    }
}

fn string_inner(pair: Pair<'_, Rule>) -> &str {
    pair.into_inner().next().map(|inner| inner.as_str()).unwrap_or("")
}

fn build_number(text: &str, offset: usize) -> Result<Value, EngineError> {
    let is_integer = !text.contains(&['.', 'e', 'E'][..]);
    if is_integer {
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::from(n));
        }
        if let Ok(n) = text.parse::<u64>() {
            return Ok(Value::from(n));
        }
    }

    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| EngineError::syntax(offset, format!("number out of range: {text}")))
}

/// Decode JSON string escapes. The grammar has already validated them.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let high = read_hex4(&mut chars);
                let code = if (0xD800..0xDC00).contains(&high) {
                    // Surrogate pair: expect `\uDC00`-`\uDFFF` next
                    let mut lookahead = chars.clone();
                    if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
                        let low = read_hex4(&mut lookahead);
                        if (0xDC00..0xE000).contains(&low) {
                            chars = lookahead;
                            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                        } else {
                            high
                        }
                    } else {
                        high
                    }
                } else {
                    high
                };
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> u32 {
    let digits: String = chars.by_ref().take(4).collect();
    u32::from_str_radix(&digits, 16).unwrap_or(0xFFFD)
}
