//! `RecordStore` backed by a concurrent map of collections

use dashmap::DashMap;
use mindgo_core::{CoreError, RecordStore};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// In-memory implementation of `RecordStore`
///
/// Clones share the same underlying collections.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    collections: Arc<DashMap<String, Vec<Value>>>,
}

impl InMemoryRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from a snapshot object
    ///
    /// Array values become the collection's records; any other value is kept
    /// as a single-record collection.
    pub fn from_snapshot(snapshot: &Value) -> Result<Self, CoreError> {
        let entries = snapshot.as_object().ok_or_else(|| {
            CoreError::SerializationError("Snapshot must be a JSON object".to_string())
        })?;

        let store = Self::new();
        for (key, value) in entries {
            let records = match value {
                Value::Array(records) => records.clone(),
                other => vec![other.clone()],
            };
            store.collections.insert(key.clone(), records);
        }

        debug!(collections = store.collections.len(), "Restored record store snapshot");
        Ok(store)
    }

    /// Parse and restore a snapshot from JSON text
    pub fn from_snapshot_str(json: &str) -> Result<Self, CoreError> {
        let snapshot: Value = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }

    /// Export every collection as one JSON object of arrays
    pub fn snapshot(&self) -> Value {
        let mut entries = Map::new();
        for entry in self.collections.iter() {
            entries.insert(entry.key().clone(), Value::Array(entry.value().clone()));
        }
        Value::Object(entries)
    }

    /// Names of the non-empty collections, sorted
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Number of records in `collection`
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map_or(0, |records| records.len())
    }

    /// Remove one collection, returning its records
    pub fn remove(&self, collection: &str) -> Vec<Value> {
        self.collections
            .remove(collection)
            .map(|(_, records)| records)
            .unwrap_or_default()
    }

    /// Remove every collection
    pub fn clear(&self) {
        self.collections.clear();
        debug!("Cleared record store");
    }
}

impl RecordStore for InMemoryRecordStore {
    fn append(&self, collection: &str, record: Value) -> Result<(), CoreError> {
        let mut records = self.collections.entry(collection.to_string()).or_default();
        records.push(record);
        debug!(collection = %collection, records = records.len(), "Appended record");
        Ok(())
    }

    fn get(&self, collection: &str) -> Result<Vec<Value>, CoreError> {
        Ok(self
            .collections
            .get(collection)
            .map(|records| records.value().clone())
            .unwrap_or_default())
    }

    fn latest(&self, collection: &str) -> Result<Option<Value>, CoreError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|records| records.last().cloned()))
    }
}
