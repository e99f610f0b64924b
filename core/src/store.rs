//! Persistent variable storage
//!
//! The engine only sees the `VariableStore` trait. Keys are flat identifiers;
//! dotted lookups like `$$user.name` are resolved by the engine on top of the
//! value stored under `user`.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Key/value store injected into every execution context
#[async_trait]
pub trait VariableStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    /// Store `value` under `key` and return it
    async fn set(&self, key: &str, value: Value) -> Result<Value>;
    /// Returns whether the key existed
    async fn delete(&self, key: &str) -> Result<bool>;
    async fn list(&self) -> Result<Vec<String>>;
    /// Returns whether anything was removed
    async fn clear(&self) -> Result<bool>;
}

/* ===================== MemoryStore ===================== */

/// In-memory VariableStore for the CLI and tests
pub struct MemoryStore {
    inner: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Seed the store from a JSON object (one variable per member)
    pub fn from_json(seed: Value) -> Result<Self> {
        let Value::Object(members) = seed else {
            bail!("variable seed must be a JSON object");
        };
        for key in members.keys() {
            validate_key(key)?;
        }
        Ok(Self {
            inner: RwLock::new(members.into_iter().collect()),
        })
    }

    /// Seed the store from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read variables file {}", path.display()))?;
        let seed: Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse variables file {}", path.display()))?;
        Self::from_json(seed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("variable name must not be empty");
    }
    if key.contains('.') {
        bail!("variable name '{key}' must not contain '.'");
    }
    Ok(())
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("variable store lock poisoned")
}

#[async_trait]
impl VariableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<Value> {
        validate_key(key)?;
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.insert(key.to_string(), value.clone());
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        Ok(inner.remove(key).is_some())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().map_err(poisoned)?;
        let mut keys: Vec<String> = inner.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> Result<bool> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let had_values = !inner.is_empty();
        inner.clear();
        Ok(had_values)
    }
}
