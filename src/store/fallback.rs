use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

use super::{LedgerStore, MemoryStore, Record};
use crate::error::StoreError;

/// Wraps a primary store and degrades to a transient memory store the
/// first time the primary reports itself unavailable. Once degraded it
/// stays degraded for the life of the process so reads never mix the two.
/// Malformed-record errors are passed through untouched.
pub struct FallbackStore {
    primary: Arc<dyn LedgerStore>,
    transient: MemoryStore,
    degraded: AtomicBool,
}

impl FallbackStore {
    pub fn new(primary: Arc<dyn LedgerStore>) -> Self {
        Self {
            primary,
            transient: MemoryStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    fn with_fallback<T>(
        &self,
        op: &str,
        primary: impl FnOnce(&dyn LedgerStore) -> Result<T, StoreError>,
        transient: impl FnOnce(&MemoryStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        if self.is_degraded() {
            return transient(&self.transient);
        }
        match primary(self.primary.as_ref()) {
            Err(err) if err.is_unavailable() => {
                if !self.degraded.swap(true, Ordering::SeqCst) {
                    warn!(
                        "⚠️  {} store unavailable during {}: {} - using memory",
                        self.primary.backend(),
                        op,
                        err
                    );
                }
                transient(&self.transient)
            }
            other => other,
        }
    }
}

impl LedgerStore for FallbackStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.with_fallback("get", |s| s.get(key), |m| m.get(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let copy = value.clone();
        self.with_fallback("set", |s| s.set(key, value), |m| m.set(key, copy))
    }

    fn hash_get(&self, key: &str) -> Result<Option<Record>, StoreError> {
        self.with_fallback("hash_get", |s| s.hash_get(key), |m| m.hash_get(key))
    }

    fn hash_set(&self, key: &str, record: Record) -> Result<(), StoreError> {
        let copy = record.clone();
        self.with_fallback("hash_set", |s| s.hash_set(key, record), |m| m.hash_set(key, copy))
    }

    fn backend(&self) -> &'static str {
        if self.is_degraded() {
            "memory-fallback"
        } else {
            self.primary.backend()
        }
    }

    fn flush(&self) -> Result<(), StoreError> {
        if self.is_degraded() {
            return Ok(());
        }
        self.primary.flush()
    }
}
