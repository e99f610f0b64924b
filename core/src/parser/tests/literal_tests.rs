//! Tests for the tier 3 literal grammar

use serde_json::json;

use crate::executor::errors::EngineError;
use crate::parser::{check_nesting, parse_literal, validate_depth};

#[test]
fn test_parses_json_object() {
    let value = parse_literal(r#"{"items": [1, 2.5, -3], "ok": true, "none": null}"#).unwrap();
    assert_eq!(value, json!({"items": [1, 2.5, -3], "ok": true, "none": null}));
}

#[test]
fn test_bare_keys_and_trailing_commas() {
    let value = parse_literal(r#"{ value: "x", cases: { a: "1", b: "2", }, }"#).unwrap();
    assert_eq!(value, json!({"value": "x", "cases": {"a": "1", "b": "2"}}));
}

#[test]
fn test_string_escapes() {
    let value = parse_literal(r#"{"s": "line\nnext \"q\" é 😀"}"#).unwrap();
    assert_eq!(value, json!({"s": "line\nnext \"q\" é 😀"}));
}

#[test]
fn test_invocation_text_is_kept_verbatim() {
    let value = parse_literal(r#"{"code": "$if[$$x == 1; yes]"}"#).unwrap();
    assert_eq!(value, json!({"code": "$if[$$x == 1; yes]"}));
}

#[test]
fn test_member_order_is_preserved() {
    let value = parse_literal(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

#[test]
fn test_malformed_literal_is_syntax_error() {
    let err = parse_literal(r#"{"a": }"#).unwrap_err();
    assert!(matches!(err, EngineError::Syntax { .. }));

    let err = parse_literal(r#"{"a": 1} trailing"#).unwrap_err();
    assert!(matches!(err, EngineError::Syntax { .. }));
}

#[test]
fn test_serialized_literal_reparses_to_same_value() {
    let sources = [
        r#"{ name: "Ada", tags: ["a", "b",], nested: { deep: [ { x: 1e3 } ] } }"#,
        r#"{"empty": {}, "list": [], "text": "tab\there", "n": -0.5}"#,
    ];
    for source in sources {
        let value = parse_literal(source).unwrap();
        let reparsed = parse_literal(&serde_json::to_string(&value).unwrap()).unwrap();
        assert_eq!(value, reparsed, "round trip of {source}");
    }
}

#[test]
fn test_depth_limit() {
    let value = json!({"a": {"b": {"c": 1}}});
    assert!(validate_depth(&value, 3).is_ok());
    assert!(matches!(
        validate_depth(&value, 2),
        Err(EngineError::Syntax { .. })
    ));
}

#[test]
fn test_nesting_checked_before_parsing() {
    assert!(check_nesting(r#"{"a": [{"b": "[[[{{"}]}"#, 3).is_ok());
    assert!(matches!(
        check_nesting(r#"{"a": [{"b": 1}]}"#, 2),
        Err(EngineError::Syntax { offset: 7, .. })
    ));

    let deep = format!("{}1{}", r#"{"a":"#.repeat(5_000), "}".repeat(5_000));
    assert!(check_nesting(&deep, 32).is_err());
}
