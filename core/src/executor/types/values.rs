//! Runtime value helpers
//!
//! Values are `serde_json::Value` throughout the engine.

use serde_json::Value;

/// Text form of a value in a textual position.
///
/// Strings are inserted as is, `null` disappears, numbers and booleans use
/// their display form, arrays and objects become compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Truthiness of a value used as a condition operand
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => is_truthy_text(s),
        Value::Array(items) => !items.is_empty(),
        Value::Object(members) => !members.is_empty(),
    }
}

pub fn is_truthy_text(text: &str) -> bool {
    let text = text.trim();
    !(text.is_empty()
        || text == "0"
        || ["false", "null", "no", "off"]
            .iter()
            .any(|falsy| text.eq_ignore_ascii_case(falsy)))
}
