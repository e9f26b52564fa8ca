use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One mutex per key (market id, or an index key). Operations that read a
/// record, compute a new state and write it back hold the key's mutex for
/// the whole sequence so concurrent callers cannot lose each other's writes.
///
/// Slots only live while some caller holds or waits on them, so lookups of
/// unknown ids leave nothing behind.
#[derive(Debug, Default)]
pub struct MarketLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MarketLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutex guarding `key`. Lock it with [`MarketLocks::hold`].
    pub fn slot(&self, key: &str) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Runs `f` while holding the mutex for `key`
    pub fn hold<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let slot = self.slot(key);
        let result = {
            let _guard = slot.lock().unwrap_or_else(|e| e.into_inner());
            f()
        };
        self.release(key, &slot);
        result
    }

    /// Number of keys currently holding a slot
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Clones are only handed out under the map lock, so a count of two
    // (map + ours) means nobody else holds or waits on this slot.
    fn release(&self, key: &str, slot: &Arc<Mutex<()>>) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let idle = slots
            .get(key)
            .map_or(false, |held| Arc::ptr_eq(held, slot) && Arc::strong_count(slot) == 2);
        if idle {
            slots.remove(key);
        }
    }
}
