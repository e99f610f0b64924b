//! Tests for tier 1 and tier 2 splitting

use maplit::hashmap;

use crate::parser::args::dedup_last;
use crate::parser::{named_pairs, split_named, split_positional};

/* ===================== Tier 1 ===================== */

#[test]
fn test_positional_splits_on_comma_and_semicolon() {
    assert_eq!(split_positional(" a , b;c "), vec!["a", "b", "c"]);
}

#[test]
fn test_positional_empty_span_has_no_arguments() {
    assert!(split_positional("").is_empty());
    assert!(split_positional("   ").is_empty());
}

#[test]
fn test_positional_keeps_empty_middle_pieces() {
    assert_eq!(split_positional("a;;b"), vec!["a", "", "b"]);
}

#[test]
fn test_positional_keeps_nested_invocations_verbatim() {
    assert_eq!(
        split_positional("set; k; $random[1, 1]"),
        vec!["set", "k", "$random[1, 1]"]
    );
}

#[test]
fn test_positional_respects_quotes_and_braces() {
    assert_eq!(
        split_positional(r#""a, b", {"x": 1, "y": 2}"#),
        vec![r#""a, b""#, r#"{"x": 1, "y": 2}"#]
    );
}

/* ===================== Tier 2 ===================== */

#[test]
fn test_named_maps_keys_to_trimmed_values() {
    assert_eq!(
        split_named("condition: $$x == 1 ; then : yes"),
        hashmap! {
            "condition".to_string() => "$$x == 1".to_string(),
            "then".to_string() => "yes".to_string(),
        }
    );
}

#[test]
fn test_named_splits_at_first_colon_only() {
    assert_eq!(
        split_named("at: 10:30"),
        hashmap! { "at".to_string() => "10:30".to_string() }
    );
}

#[test]
fn test_named_duplicate_key_last_wins() {
    assert_eq!(
        split_named("a: 1; a: 2"),
        hashmap! { "a".to_string() => "2".to_string() }
    );
}

#[test]
fn test_named_ignores_pieces_without_colon() {
    assert_eq!(
        split_named("a: 1; stray; b: 2"),
        hashmap! {
            "a".to_string() => "1".to_string(),
            "b".to_string() => "2".to_string(),
        }
    );
}

#[test]
fn test_named_value_may_contain_nested_named_invocation() {
    let pairs = named_pairs("then: $if[condition: 1; then: x]; else: y");
    assert_eq!(
        pairs,
        vec![
            ("then".to_string(), "$if[condition: 1; then: x]".to_string()),
            ("else".to_string(), "y".to_string()),
        ]
    );
}

#[test]
fn test_dedup_last_keeps_source_order_of_survivors() {
    let pairs = vec![
        ("a".to_string(), "1".to_string()),
        ("b".to_string(), "2".to_string()),
        ("a".to_string(), "3".to_string()),
    ];
    assert_eq!(
        dedup_last(pairs),
        vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "3".to_string()),
        ]
    );
}
