//! State store
//!
//! Process-wide (per engine) key/value table of the latest fetched
//! values. Pure map semantics: last write wins, entries are never
//! deleted, no validation of value shape.

use std::collections::HashMap;

/// Key/value table of decoded fetch results
#[derive(Debug, Default)]
pub struct StateStore {
    values: HashMap<String, serde_json::Value>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under a key, replacing any previous value
    pub fn set_value(&mut self, key: &str, value: serde_json::Value) {
        tracing::debug!("store write: {}", key);
        self.values.insert(key.to_string(), value);
    }

    /// Read the latest value for a key
    pub fn get_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Check for a key
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_write_wins() {
        let mut store = StateStore::new();
        store.set_value("todo", json!({"items": ["a"]}));
        store.set_value("todo", json!({"items": ["a", "b"]}));

        assert_eq!(store.get_value("todo"), Some(&json!({"items": ["a", "b"]})));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let store = StateStore::new();
        assert_eq!(store.get_value("absent"), None);
        assert!(!store.contains("absent"));
    }
}
