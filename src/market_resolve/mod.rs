// ============================================================================
// Market Resolve Module - Core Market & Betting Logic
// ============================================================================
//
// This module contains the core prediction market functionality:
//   - pool_share: pool-share AMM pricing and payout arithmetic
//   - locks: per-market mutual exclusion for read-modify-write sequences
//   - registry: market creation, lookup, listing and votes
//   - bet_book: stake placement and bet listing
//   - settlement: resolution and proportional payouts
//
// Storage layout (see `crate::store`):
//   moltymarkets              -> [market id, ...]   (insertion order)
//   market:{id}               -> Market record
//   market:{id}:bets          -> [bet id, ...]      (insertion order)
//   bet:{id}                  -> Bet record
//
// ============================================================================

pub mod bet_book;
pub mod locks;
pub mod pool_share;
pub mod registry;
pub mod settlement;

pub use bet_book::BetBook;
pub use locks::MarketLocks;
pub use pool_share::*;
pub use registry::MarketRegistry;
pub use settlement::{Resolution, SettlementEngine};

use chrono::{DateTime, Utc};

/// Index of every market id ever created
pub const MARKET_INDEX_KEY: &str = "moltymarkets";

pub fn market_key(market_id: &str) -> String {
    format!("market:{}", market_id)
}

pub fn market_bets_key(market_id: &str) -> String {
    format!("market:{}:bets", market_id)
}

pub fn bet_key(bet_id: &str) -> String {
    format!("bet:{}", bet_id)
}

/// Most recent first; equal timestamps keep their incoming order
pub(crate) fn sort_newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}
