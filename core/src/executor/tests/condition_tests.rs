//! Tests for $if / $elseif / $else chains and condition expressions

use serde_json::json;

use super::helpers::{eval, eval_err, Harness};
use crate::executor::stdlib::conditions::text_condition_holds;
use crate::executor::EngineError;

/* ===================== Condition Expressions ===================== */

#[test]
fn test_comparisons() {
    assert!(text_condition_holds("1 == 1"));
    assert!(text_condition_holds("a != b"));
    assert!(text_condition_holds("10 > 9"));
    assert!(text_condition_holds("2.5 <= 2.50"));
    assert!(!text_condition_holds("abc >= abd"));
    assert!(text_condition_holds(r#""Ada" == Ada"#));
}

#[test]
fn test_numeric_comparison_only_when_both_sides_are_numbers() {
    // string ordering would put "10" before "9"
    assert!(text_condition_holds("10 > 9"));
    assert!(!text_condition_holds("10 > 9x"));
}

#[test]
fn test_logical_operators() {
    assert!(text_condition_holds("1 == 1 && 2 == 2"));
    assert!(!text_condition_holds("1 == 1 && 2 == 3"));
    assert!(text_condition_holds("1 == 2 || yes"));
    // && binds tighter than ||
    assert!(text_condition_holds("1 == 1 && 2 > 3 || yes"));
    assert!(!text_condition_holds("no || 1 == 1 && off"));
}

#[test]
fn test_truthiness_and_negation() {
    for falsy in ["", "0", "false", "FALSE", "null", "no", "off", "  "] {
        assert!(!text_condition_holds(falsy), "{falsy:?} should be false");
    }
    assert!(text_condition_holds("yes"));
    assert!(text_condition_holds("!0"));
    assert!(!text_condition_holds("!1"));
}

#[tokio::test]
async fn test_cond_macro() {
    assert_eq!(eval("$cond[3 >= 3]").await, json!(true));
    assert_eq!(eval("$cond[off]").await, json!(false));
}

/* ===================== Chains ===================== */

#[tokio::test]
async fn test_if_selects_branch() {
    assert_eq!(eval("$if[1 == 1; yes; no]").await, json!("yes"));
    assert_eq!(eval("$if[1 == 2; yes; no]").await, json!("no"));
    assert_eq!(eval("$if[0; yes]").await, json!(null));
}

#[tokio::test]
async fn test_if_named_form_with_variables() {
    let mut harness = Harness::new().with_binding("name", json!("Ada"));
    assert_eq!(
        harness
            .eval(r#"$if[condition: $$name == "Ada"; then: hi $$name; else: who?]"#)
            .await,
        json!("hi Ada")
    );
}

#[tokio::test]
async fn test_elseif_and_else_skip_after_true_condition() {
    let mut harness = Harness::new();
    let value = harness
        .eval("$if[1; a]$elseif[$rec[x]; b]$else[$rec[y]]")
        .await;

    assert_eq!(value, json!("a"));
    assert!(harness.calls().is_empty());
}

#[tokio::test]
async fn test_elseif_runs_when_earlier_conditions_fail() {
    assert_eq!(eval("$if[0; a]$elseif[1; b]$else[c]").await, json!("b"));
    assert_eq!(eval("$if[0; a]$elseif[0; b]$else[c]").await, json!("c"));
    assert_eq!(
        eval("$if[0; a]$elseif[0; b]$elseif[yes; c]$else[d]").await,
        json!("c")
    );
}

#[tokio::test]
async fn test_elseif_condition_evaluated_only_when_needed() {
    let mut harness = Harness::new();
    harness.eval("$if[0; a]$elseif[$rec[1]; b]").await;
    assert_eq!(harness.calls(), vec!["rec(1)"]);
}

#[tokio::test]
async fn test_nested_chain_does_not_leak_into_outer() {
    assert_eq!(eval("$if[1; $if[0; x]]$else[z]").await, json!(""));
    // the outer condition was false, so the chain's $else still runs
    assert_eq!(eval("$if[0; x; $if[1; y]]$else[z]").await, json!("yz"));
}

#[tokio::test]
async fn test_else_without_if_is_invalid() {
    assert!(matches!(
        eval_err("$else[x]").await,
        EngineError::InvalidControlFlow { .. }
    ));
    assert!(matches!(
        eval_err("$elseif[1; x]").await,
        EngineError::InvalidControlFlow { .. }
    ));
}

#[tokio::test]
async fn test_else_ends_the_chain() {
    let err = eval_err("$if[1; a]$else[b]$else[c]").await;
    match err {
        EngineError::InvalidControlFlow { name, .. } => assert_eq!(name, "else"),
        other => panic!("Expected EngineError::InvalidControlFlow, got {:?}", other),
    }
}

#[tokio::test]
async fn test_new_if_starts_new_chain() {
    assert_eq!(eval("$if[1; a]$if[0; b]$else[c]").await, json!("ac"));
}
