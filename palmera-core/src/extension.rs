use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Form fields that are not part of the typed submission shape.
///
/// The primary store keeps this blob opaque (one JSONB column); the
/// projection tables are the only place that flattens it back out for
/// downstream targets. BTreeMap keeps serialization deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ExtensionMap(BTreeMap<String, Value>);

impl ExtensionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value; anything other than an object yields an
    /// empty map.
    pub fn from_value(value: &Value) -> Self {
        match value.as_object() {
            Some(map) => Self(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            None => Self::default(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_ignores_non_objects() {
        assert!(ExtensionMap::from_value(&json!("text")).is_empty());
        assert!(ExtensionMap::from_value(&json!([1, 2])).is_empty());
        assert!(ExtensionMap::from_value(&Value::Null).is_empty());
    }

    #[test]
    fn test_typed_getters() {
        let map = ExtensionMap::from_value(&json!({
            "budgetRange": "5k-10k",
            "groupSize": 8,
            "newsletterOptIn": true,
        }));
        assert_eq!(map.get_str("budgetRange"), Some("5k-10k"));
        assert_eq!(map.get_i64("groupSize"), Some(8));
        assert_eq!(map.get_bool("newsletterOptIn"), Some(true));
        assert_eq!(map.get_str("missing"), None);
    }

    #[test]
    fn test_serializes_transparently() {
        let mut map = ExtensionMap::new();
        map.insert("checkIn", json!("2025-06-01"));
        let round = serde_json::to_value(&map).unwrap();
        assert_eq!(round, json!({"checkIn": "2025-06-01"}));
    }
}
