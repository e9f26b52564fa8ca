use serde_json::Value;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{LedgerStore, Record};
use crate::error::StoreError;

/// Transient store held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
    hashes: RwLock<HashMap<String, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
        lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
        lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LedgerStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(Self::read(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        Self::write(&self.values).insert(key.to_string(), value);
        Ok(())
    }

    fn hash_get(&self, key: &str) -> Result<Option<Record>, StoreError> {
        Ok(Self::read(&self.hashes).get(key).cloned())
    }

    fn hash_set(&self, key: &str, record: Record) -> Result<(), StoreError> {
        Self::write(&self.hashes).insert(key.to_string(), record);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
