//! Tests for `$$` variable resolution

use serde_json::json;

use super::helpers::Harness;
use crate::executor::resolver::lookup;
use crate::store::VariableStore;

fn user() -> serde_json::Value {
    json!({"name": "Ada", "roles": ["admin", "dev"]})
}

#[tokio::test]
async fn test_dotted_paths_walk_objects_and_arrays() {
    let mut harness = Harness::new().with_binding("user", user());
    assert_eq!(
        harness.eval("$$user.name / $$user.roles.1").await,
        json!("Ada / dev")
    );
    assert_eq!(
        lookup("user.roles.0", &harness.ctx).await.unwrap(),
        Some(json!("admin"))
    );
}

#[tokio::test]
async fn test_sole_reference_keeps_structure() {
    let mut harness = Harness::new().with_binding("user", user());
    assert_eq!(harness.eval("$$user").await, user());
    assert_eq!(harness.eval("$$user.roles").await, json!(["admin", "dev"]));
}

#[tokio::test]
async fn test_store_is_consulted_after_bindings() {
    let mut harness = Harness::new().with_binding("shadowed", json!("ambient"));
    harness.store.set("count", json!(3)).await.unwrap();
    harness.store.set("shadowed", json!("stored")).await.unwrap();

    assert_eq!(harness.eval("$$count").await, json!(3));
    assert_eq!(harness.eval("$$shadowed").await, json!("ambient"));
}

#[tokio::test]
async fn test_absent_paths_resolve_to_empty() {
    let mut harness = Harness::new().with_binding("user", user());
    assert_eq!(harness.eval("<$$missing>").await, json!("<>"));
    assert_eq!(harness.eval("<$$user.age>").await, json!("<>"));
    assert_eq!(harness.eval("<$$user.roles.9>").await, json!("<>"));
    assert_eq!(harness.eval("$$missing").await, json!(""));
}

#[tokio::test]
async fn test_trailing_dot_is_text() {
    let mut harness = Harness::new().with_binding("user", user());
    assert_eq!(harness.eval("Hi $$user.name.").await, json!("Hi Ada."));
}

#[tokio::test]
async fn test_structured_values_stringify_in_text() {
    let mut harness = Harness::new().with_binding("user", user());
    assert_eq!(
        harness.eval("roles=$$user.roles").await,
        json!(r#"roles=["admin","dev"]"#)
    );
}
