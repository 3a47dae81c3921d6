//! Keyed JSON value stores backing the session-state provider.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{GroveError, Result};

/// A flat string-keyed store of JSON values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn delete(&mut self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// Read `key` and deserialize it.
pub fn get_as<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|err| GroveError::Serialization(format!("decode {key}: {err}"))),
        None => Ok(None),
    }
}

/// Serialize `value` and write it under `key`.
pub fn set_as<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value)
        .map_err(|err| GroveError::Serialization(format!("encode {key}: {err}")))?;
    store.set(key, value)
}

/// In-process store, used for ephemeral sessions and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_round_trip() {
        let mut store = MemoryStore::new();
        set_as(&mut store, "storeversion", &1u32).unwrap();
        let version: Option<u32> = get_as(&store, "storeversion").unwrap();
        assert_eq!(version, Some(1));
    }

    #[test]
    fn decode_failure_names_the_key() {
        let mut store = MemoryStore::new();
        store.set("storeversion", json!("not a number")).unwrap();
        let err = get_as::<u32>(&store, "storeversion").unwrap_err();
        assert!(err.to_string().contains("storeversion"));
    }

    #[test]
    fn delete_and_keys() {
        let mut store = MemoryStore::new();
        store.set("a", json!(1)).unwrap();
        store.set("b", json!(2)).unwrap();
        store.delete("a").unwrap();
        assert_eq!(store.keys().unwrap(), ["b"]);
    }
}
