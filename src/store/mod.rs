// ============================================================================
// Ledger Store - key-value collaborator behind the market ledger
// ============================================================================
//
// The ledger only ever talks to its store through the `LedgerStore` trait:
//   - get/set: plain JSON values (used for id indexes)
//   - hash_get/hash_set: structured records (markets, bets)
//   - list_keys: ids held in an index value, in insertion order
//
// Backends:
//   - memory: process-local maps, lost on restart
//   - sled: embedded on-disk database
//   - fallback: primary backend that degrades to memory when unreachable
//
// ============================================================================

pub mod fallback;
pub mod memory;
pub mod sled_store;

pub use fallback::FallbackStore;
pub use memory::MemoryStore;
pub use sled_store::SledStore;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// A structured record: field name to JSON value
pub type Record = serde_json::Map<String, Value>;

pub trait LedgerStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    fn hash_get(&self, key: &str) -> Result<Option<Record>, StoreError>;

    fn hash_set(&self, key: &str, record: Record) -> Result<(), StoreError>;

    /// Short backend name for health output
    fn backend(&self) -> &'static str;

    /// Push buffered writes to durable storage, if the backend has any
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Ids held in the index stored under `index_key`, in insertion order
    fn list_keys(&self, index_key: &str) -> Result<Vec<String>, StoreError> {
        match self.get(index_key)? {
            None => Ok(Vec::new()),
            Some(value) => {
                serde_json::from_value(value).map_err(|e| StoreError::codec(index_key, e))
            }
        }
    }

    /// Appends `id` to the index under `index_key`.
    /// Not atomic: callers serialize access to the index themselves.
    fn push_key(&self, index_key: &str, id: &str) -> Result<(), StoreError> {
        let mut ids = self.list_keys(index_key)?;
        ids.push(id.to_string());
        self.set(index_key, Value::from(ids))
    }
}

/// Reads the record under `key` and decodes it into `T`
pub fn load<T: DeserializeOwned>(
    store: &dyn LedgerStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.hash_get(key)? {
        None => Ok(None),
        Some(record) => serde_json::from_value(Value::Object(record))
            .map(Some)
            .map_err(|e| StoreError::codec(key, e)),
    }
}

/// Encodes `value` as a record and writes it under `key`
pub fn save<T: Serialize>(store: &dyn LedgerStore, key: &str, value: &T) -> Result<(), StoreError> {
    match serde_json::to_value(value).map_err(|e| StoreError::codec(key, e))? {
        Value::Object(record) => store.hash_set(key, record),
        other => Err(StoreError::codec(
            key,
            format!("expected an object, got {}", other),
        )),
    }
}
