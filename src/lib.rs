/// MoltyMarket Prediction Ledger
/// Exports all modules for use as a library crate

pub mod app_state;
pub mod config;
pub mod error;
pub mod handlers;
pub mod market_resolve;
pub mod models;
pub mod routes;
pub mod store;

pub use app_state::{AppState, SharedState};
pub use config::{AppConfig, StoreBackend};
pub use error::{ConfigError, LedgerError, StoreError};
pub use market_resolve::{
    BetBook, MarketLocks, MarketRegistry, Resolution, SettlementEngine,
    HOUSE_FEE_RATE, MIN_BET_AMOUNT, PAYOUT_RATE,
};
pub use models::{Bet, Market, MarketKind, MarketStatus, Side};
pub use routes::build_router;
pub use store::{FallbackStore, LedgerStore, MemoryStore, Record, SledStore};
