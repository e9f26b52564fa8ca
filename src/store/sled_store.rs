use serde_json::Value;
use std::path::Path;

use super::{LedgerStore, Record};
use crate::error::StoreError;

/// Embedded on-disk store. Values and records live in separate trees,
/// both JSON-encoded.
pub struct SledStore {
    db: sled::Db,
    values: sled::Tree,
    hashes: sled::Tree,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Throwaway database removed on drop
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        let values = db.open_tree("values")?;
        let hashes = db.open_tree("hashes")?;
        Ok(Self { db, values, hashes })
    }

    fn read_json<T: serde::de::DeserializeOwned>(
        tree: &sled::Tree,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        match tree.get(key.as_bytes())? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::codec(key, e)),
        }
    }

    fn write_json<T: serde::Serialize>(
        tree: &sled::Tree,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value).map_err(|e| StoreError::codec(key, e))?;
        tree.insert(key.as_bytes(), bytes)?;
        Ok(())
    }
}

impl LedgerStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Self::read_json(&self.values, key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        Self::write_json(&self.values, key, &value)
    }

    fn hash_get(&self, key: &str) -> Result<Option<Record>, StoreError> {
        Self::read_json(&self.hashes, key)
    }

    fn hash_set(&self, key: &str, record: Record) -> Result<(), StoreError> {
        Self::write_json(&self.hashes, key, &record)
    }

    fn backend(&self) -> &'static str {
        "sled"
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}
