//! Tests for $try / $throw

use serde_json::json;

use super::helpers::{eval, Harness};
use crate::executor::EngineError;

#[tokio::test]
async fn test_catch_output_is_returned() {
    assert_eq!(
        eval("$try[$throw[boom]; caught $$error.message]").await,
        json!("caught boom")
    );
}

#[tokio::test]
async fn test_error_binding_members() {
    assert_eq!(
        eval("$try[$throw[message: nope; kind: Oops]; $$error.kind]").await,
        json!("Oops")
    );
    assert_eq!(
        eval("$try[$if[1; $throw[x]]; $$error.stack]").await,
        json!("try > if > throw")
    );
    assert_eq!(
        eval("$try[$throw[x]; $$error.source]").await,
        json!("$throw[x]")
    );
}

#[tokio::test]
async fn test_engine_errors_are_catchable() {
    assert_eq!(
        eval("$try[$nope[]; $$error.kind]").await,
        json!("UnknownMacroError")
    );
    assert_eq!(
        eval("$try[$break[]; $$error.kind]").await,
        json!("InvalidControlFlowError")
    );
}

#[tokio::test]
async fn test_success_returns_code_or_finally_result() {
    assert_eq!(eval("$try[ok; no]").await, json!("ok"));
    assert_eq!(eval("$try[ok; no; done]").await, json!("done"));
}

#[tokio::test]
async fn test_finally_runs_after_catch() {
    let mut harness = Harness::new();
    let value = harness
        .eval("$try[$throw[a]; caught; $data[set; f; 1]]")
        .await;

    assert_eq!(value, json!("caught"));
    assert_eq!(harness.stored("f").await, Some(json!("1")));
}

#[tokio::test]
async fn test_without_catch_rethrows_after_finally() {
    let mut harness = Harness::new();
    let err = harness
        .eval_err("$try[code: $throw[x]; finally: $data[set; cleaned; yes]]")
        .await;

    match err {
        EngineError::Runtime(context) => assert_eq!(context.message, "x"),
        other => panic!("Expected EngineError::Runtime, got {:?}", other),
    }
    assert_eq!(harness.stored("cleaned").await, Some(json!("yes")));
}

#[tokio::test]
async fn test_error_binding_is_scoped_to_catch() {
    assert_eq!(eval("$try[$throw[a]; x]<$$error>").await, json!("x<>"));
}

#[tokio::test]
async fn test_throw_default_kind() {
    let mut harness = Harness::new();
    let err = harness.eval_err("$throw[it broke, badly]").await;
    assert_eq!(err.kind(), "CustomError");
    assert_eq!(err.to_string(), "it broke, badly");
}
