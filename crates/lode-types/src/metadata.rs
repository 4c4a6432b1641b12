use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered string-to-JSON map carried alongside an artifact's bytes.
///
/// Metadata is opaque to the core: value codecs and transformers read and
/// write entries (`"encoding"`, `"checksum"`, `"size"`, ...), the store just
/// persists the map next to the bytes. A `BTreeMap` keeps serialization
/// deterministic, which matters for anything that hashes a manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    /// Create an empty metadata map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up an entry as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Look up an entry as an unsigned integer.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Returns `true` if the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Remove an entry.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Merge `other` into `self`; entries from `other` win on collision.
    pub fn merge(&mut self, other: Metadata) {
        self.0.extend(other.0);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_and_get() {
        let mut meta = Metadata::new();
        meta.insert("encoding", "utf-8");
        meta.insert("size", 42u64);
        assert_eq!(meta.get_str("encoding"), Some("utf-8"));
        assert_eq!(meta.get_u64("size"), Some(42));
        assert!(meta.get("missing").is_none());
    }

    #[test]
    fn merge_other_wins() {
        let mut base = Metadata::new();
        base.insert("a", 1);
        base.insert("b", 1);
        let mut overlay = Metadata::new();
        overlay.insert("b", 2);
        overlay.insert("c", 3);

        base.merge(overlay);
        assert_eq!(base.get_u64("a"), Some(1));
        assert_eq!(base.get_u64("b"), Some(2));
        assert_eq!(base.get_u64("c"), Some(3));
    }

    #[test]
    fn serializes_transparently_with_sorted_keys() {
        let mut meta = Metadata::new();
        meta.insert("zebra", 1);
        meta.insert("alpha", 2);
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"alpha":2,"zebra":1}"#);
    }

    #[test]
    fn serde_roundtrip() {
        let mut meta = Metadata::new();
        meta.insert("nested", json!({"k": [1, 2, 3]}));
        let json = serde_json::to_string(&meta).unwrap();
        let parsed: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, parsed);
    }
}
