// Application state management

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{AppConfig, StoreBackend};
use crate::error::{Result, StoreError};
use crate::market_resolve::{BetBook, MarketLocks, MarketRegistry, SettlementEngine};
use crate::store::{FallbackStore, LedgerStore, MemoryStore, SledStore};

pub type SharedState = Arc<AppState>;

/// Everything a request handler needs. The store is injected, so tests and
/// the binary decide its lifetime.
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub registry: MarketRegistry,
    pub bet_book: BetBook,
    pub settlement: SettlementEngine,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        let locks = Arc::new(MarketLocks::new());
        Self {
            registry: MarketRegistry::new(store.clone(), locks.clone()),
            bet_book: BetBook::new(store.clone(), locks.clone()),
            settlement: SettlementEngine::new(store.clone(), locks),
            store,
        }
    }

    /// Build the state described by `config`: open the store, wrap it in
    /// the fallback layer if asked, and seed demo markets if enabled.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let state = Self::new(open_store(config)?);
        info!("💾 Ledger store: {}", state.store.backend());

        if config.seed_demo_markets {
            state.registry.seed_defaults()?;
        }
        Ok(state)
    }

    pub fn shutdown(&self) {
        match self.store.flush() {
            Ok(()) => info!("✅ Ledger store flushed"),
            Err(e) => warn!("❌ Failed to flush ledger store: {}", e),
        }
    }
}

fn open_store(config: &AppConfig) -> std::result::Result<Arc<dyn LedgerStore>, StoreError> {
    let primary: Arc<dyn LedgerStore> = match config.store_backend {
        StoreBackend::Memory => return Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Sled => match SledStore::open(&config.data_dir) {
            Ok(store) => Arc::new(store),
            Err(e) if config.store_fallback => {
                warn!(
                    "⚠️  Could not open sled store at {:?}: {} - using memory",
                    config.data_dir, e
                );
                return Ok(Arc::new(MemoryStore::new()));
            }
            Err(e) => return Err(e),
        },
    };

    if config.store_fallback {
        Ok(Arc::new(FallbackStore::new(primary)))
    } else {
        Ok(primary)
    }
}
