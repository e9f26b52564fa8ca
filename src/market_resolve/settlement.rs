use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use super::pool_share::{self, HOUSE_FEE_RATE};
use super::{bet_key, market_key, BetBook, MarketLocks};
use crate::error::{LedgerError, Result};
use crate::models::{Bet, Market, MarketStatus, Side};
use crate::store::{self, LedgerStore};

/// Result of settling a market
#[derive(Debug, Clone)]
pub struct Resolution {
    pub market: Market,
    /// Number of bets on the winning side
    pub winners: usize,
    /// Sum of all payouts assigned
    pub paid_out: f64,
}

/// Resolves markets and pays out winning bets
pub struct SettlementEngine {
    store: Arc<dyn LedgerStore>,
    locks: Arc<MarketLocks>,
    bets: BetBook,
}

impl SettlementEngine {
    pub fn new(store: Arc<dyn LedgerStore>, locks: Arc<MarketLocks>) -> Self {
        let bets = BetBook::new(store.clone(), locks.clone());
        Self { store, locks, bets }
    }

    /// Resolve a market to `outcome` and pay the winners.
    ///
    /// Each winning bet receives `floor(amount / winning_stake * pool * 0.95)`
    /// where the pool is the stake on both sides. Whatever is not paid out
    /// (fee plus rounding) is recorded on the market as `house_retained`.
    ///
    /// The resolved market is written before any payout, so a bet never
    /// carries a payout while its market is still open. Resolving again to
    /// the same outcome rewrites any payout an interrupted settlement left
    /// behind and pays nobody twice; a different outcome is rejected with
    /// [`LedgerError::AlreadyResolved`].
    pub fn resolve(&self, market_id: &str, outcome: Option<&str>) -> Result<Resolution> {
        self.locks.hold(market_id, || -> Result<Resolution> {
            let mut market: Market = store::load(self.store.as_ref(), &market_key(market_id))?
                .ok_or_else(|| LedgerError::NotFound(market_id.to_string()))?;

            let outcome = outcome
                .and_then(Side::parse)
                .ok_or_else(|| LedgerError::validation("Outcome must be yes or no"))?;

            let bets = self.bets.load_bets(market_id)?;
            let pool = market.pool();
            let due = payouts_due(&bets, outcome, pool);
            let winners = bets.iter().filter(|b| b.side == outcome).count();
            let paid_out: f64 = due.iter().flatten().sum();

            if let Some(previous) = market.outcome {
                if previous != outcome {
                    return Err(LedgerError::AlreadyResolved {
                        market_id: market_id.to_string(),
                        outcome: previous,
                    });
                }
                let repaired = self.write_payouts(bets, &due)?;
                debug!(
                    "market {} already resolved to {}, {} payouts rewritten",
                    market_id, outcome, repaired
                );
                return Ok(Resolution { market, winners, paid_out });
            }

            market.status = MarketStatus::Resolved;
            market.outcome = Some(outcome);
            market.resolved_at = Some(Utc::now());
            market.house_retained = Some(pool - paid_out);
            store::save(self.store.as_ref(), &market_key(market_id), &market)?;

            self.write_payouts(bets, &due)?;

            info!(
                "✅ MARKET_RESOLVED | {} -> {} | pool {} | {} winners paid {} | fee {:.4} | house keeps {}",
                market_id,
                outcome,
                pool,
                winners,
                paid_out,
                pool * HOUSE_FEE_RATE,
                pool - paid_out
            );

            Ok(Resolution { market, winners, paid_out })
        })
    }

    /// Stores `due[i]` as the payout of `bets[i]` wherever it differs.
    /// Returns how many bets were rewritten.
    fn write_payouts(&self, bets: Vec<Bet>, due: &[Option<f64>]) -> Result<usize> {
        let mut written = 0;
        for (mut bet, payout) in bets.into_iter().zip(due.iter().copied()) {
            if bet.payout != payout {
                bet.payout = payout;
                store::save(self.store.as_ref(), &bet_key(&bet.id), &bet)?;
                written += 1;
            }
        }
        Ok(written)
    }
}

/// Payout owed to each bet once the market settles on `outcome`.
/// Losing bets, and every bet when nobody staked on the winning side, get none.
fn payouts_due(bets: &[Bet], outcome: Side, pool: f64) -> Vec<Option<f64>> {
    let winning_stake: f64 = bets
        .iter()
        .filter(|b| b.side == outcome)
        .map(|b| b.amount)
        .sum();
    bets.iter()
        .map(|b| {
            (b.side == outcome && winning_stake > 0.0)
                .then(|| pool_share::payout(b.amount, winning_stake, pool))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_resolve::MarketRegistry;
    use crate::error::StoreError;
    use crate::models::{CreateMarketRequest, EndDateInput, PlaceBetRequest};
    use crate::store::{MemoryStore, Record};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Memory store whose record writes start failing once `writes_left` runs out
    struct FlakyStore {
        inner: MemoryStore,
        writes_left: AtomicUsize,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                writes_left: AtomicUsize::new(usize::MAX),
            }
        }

        fn allow_writes(&self, n: usize) {
            self.writes_left.store(n, Ordering::SeqCst);
        }
    }

    impl LedgerStore for FlakyStore {
        fn get(&self, key: &str) -> std::result::Result<Option<Value>, StoreError> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: Value) -> std::result::Result<(), StoreError> {
            self.inner.set(key, value)
        }
        fn hash_get(&self, key: &str) -> std::result::Result<Option<Record>, StoreError> {
            self.inner.hash_get(key)
        }
        fn hash_set(&self, key: &str, record: Record) -> std::result::Result<(), StoreError> {
            let left = self.writes_left.load(Ordering::SeqCst);
            if left == 0 {
                return Err(StoreError::Unavailable("write timed out".to_string()));
            }
            if left != usize::MAX {
                self.writes_left.store(left - 1, Ordering::SeqCst);
            }
            self.inner.hash_set(key, record)
        }
        fn backend(&self) -> &'static str {
            "flaky"
        }
    }

    struct Fixture {
        registry: MarketRegistry,
        book: BetBook,
        engine: SettlementEngine,
        market_id: String,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
        let locks = Arc::new(MarketLocks::new());
        let registry = MarketRegistry::new(store.clone(), locks.clone());
        let market_id = registry
            .create(CreateMarketRequest::new(
                "Will KingMolt be #1 this week?",
                EndDateInput::Text("2026-02-08".to_string()),
            ))
            .unwrap()
            .id;
        Fixture {
            registry,
            book: BetBook::new(store.clone(), locks.clone()),
            engine: SettlementEngine::new(store, locks),
            market_id,
        }
    }

    impl Fixture {
        fn bet(&self, amount: f64, side: Side) -> String {
            self.book
                .place_bet(&self.market_id, PlaceBetRequest::new(amount, side))
                .unwrap()
                .0
                .id
        }

        fn payout_of(&self, bet_id: &str) -> Option<f64> {
            self.book
                .list_bets(&self.market_id)
                .unwrap()
                .into_iter()
                .find(|b| b.id == bet_id)
                .and_then(|b| b.payout)
        }
    }

    #[test]
    fn test_single_winner() {
        let f = fixture();
        let a = f.bet(10.0, Side::Yes);
        let b = f.bet(5.0, Side::No);

        let resolution = f.engine.resolve(&f.market_id, Some("yes")).unwrap();

        assert_eq!(resolution.winners, 1);
        assert_eq!(resolution.market.status, MarketStatus::Resolved);
        assert_eq!(resolution.market.outcome, Some(Side::Yes));
        assert!(resolution.market.resolved_at.is_some());
        assert_eq!(f.payout_of(&a), Some(14.0));
        assert_eq!(f.payout_of(&b), None);
        assert_eq!(resolution.market.house_retained, Some(1.0));
    }

    #[test]
    fn test_floor_leaves_undistributed_remainder() {
        let f = fixture();
        let first = f.bet(10.0, Side::Yes);
        let second = f.bet(30.0, Side::Yes);
        f.bet(10.0, Side::No);

        let resolution = f.engine.resolve(&f.market_id, Some("yes")).unwrap();

        assert_eq!(resolution.winners, 2);
        assert_eq!(f.payout_of(&first), Some(11.0));
        assert_eq!(f.payout_of(&second), Some(35.0));
        assert_eq!(resolution.paid_out, 46.0);
        assert!(resolution.paid_out < 47.5);
        assert_eq!(resolution.market.house_retained, Some(4.0));
    }

    #[test]
    fn test_no_winning_stake() {
        let f = fixture();
        let loser = f.bet(7.0, Side::No);

        let resolution = f.engine.resolve(&f.market_id, Some("yes")).unwrap();

        assert_eq!(resolution.winners, 0);
        assert_eq!(resolution.paid_out, 0.0);
        assert_eq!(f.payout_of(&loser), None);
        assert_eq!(resolution.market.house_retained, Some(7.0));
    }

    #[test]
    fn test_resolve_empty_market() {
        let f = fixture();
        let resolution = f.engine.resolve(&f.market_id, Some("no")).unwrap();
        assert_eq!(resolution.winners, 0);
        assert_eq!(resolution.market.house_retained, Some(0.0));
    }

    #[test]
    fn test_resolve_errors() {
        let f = fixture();
        assert!(matches!(
            f.engine.resolve("missing", Some("yes")),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            f.engine.resolve(&f.market_id, Some("maybe")),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            f.engine.resolve(&f.market_id, None),
            Err(LedgerError::Validation(_))
        ));
        assert!(f.registry.get(&f.market_id).unwrap().is_open());
    }

    #[test]
    fn test_resolved_market_rejects_bets() {
        let f = fixture();
        f.bet(1.0, Side::Yes);
        f.engine.resolve(&f.market_id, Some("yes")).unwrap();

        let err = f
            .book
            .place_bet(&f.market_id, PlaceBetRequest::new(1.0, Side::No))
            .unwrap_err();
        assert!(matches!(err, LedgerError::MarketClosed(_)));

        let market = f.registry.get(&f.market_id).unwrap();
        assert_eq!(market.total_yes, 1.0);
        assert_eq!(market.total_no, 0.0);
    }

    #[test]
    fn test_repeat_resolution_does_not_pay_twice() {
        let f = fixture();
        let a = f.bet(10.0, Side::Yes);
        f.bet(5.0, Side::No);

        let first = f.engine.resolve(&f.market_id, Some("yes")).unwrap();
        let again = f.engine.resolve(&f.market_id, Some("yes")).unwrap();

        assert_eq!(again.winners, 1);
        assert_eq!(again.paid_out, 14.0);
        assert_eq!(again.market.resolved_at, first.market.resolved_at);
        assert_eq!(f.payout_of(&a), Some(14.0));

        let flipped = f.engine.resolve(&f.market_id, Some("no")).unwrap_err();
        assert!(matches!(
            flipped,
            LedgerError::AlreadyResolved { outcome: Side::Yes, .. }
        ));
    }

    #[test]
    fn test_interrupted_settlement_completes_on_retry() {
        let store = Arc::new(FlakyStore::new());
        let locks = Arc::new(MarketLocks::new());
        let shared: Arc<dyn LedgerStore> = store.clone();
        let registry = MarketRegistry::new(shared.clone(), locks.clone());
        let book = BetBook::new(shared.clone(), locks.clone());
        let engine = SettlementEngine::new(shared, locks);

        let market_id = registry
            .create(CreateMarketRequest::new(
                "Will a new agent religion emerge?",
                EndDateInput::Text("2026-02-08".to_string()),
            ))
            .unwrap()
            .id;
        for (amount, side) in [(10.0, Side::No), (30.0, Side::No), (10.0, Side::Yes)] {
            book.place_bet(&market_id, PlaceBetRequest::new(amount, side)).unwrap();
        }

        // Market record goes through, the first payout write does not
        store.allow_writes(1);
        let err = engine.resolve(&market_id, Some("no")).unwrap_err();
        assert!(matches!(err, LedgerError::StoreUnavailable(_)));

        let market = registry.get(&market_id).unwrap();
        assert_eq!(market.status, MarketStatus::Resolved);
        assert_eq!(market.outcome, Some(Side::No));
        assert_eq!(market.house_retained, Some(4.0));
        assert!(book.list_bets(&market_id).unwrap().iter().all(|b| b.payout.is_none()));

        store.allow_writes(usize::MAX);
        let retried = engine.resolve(&market_id, Some("no")).unwrap();
        assert_eq!(retried.winners, 2);
        assert_eq!(retried.paid_out, 46.0);
        assert_eq!(retried.market.resolved_at, market.resolved_at);

        let again = engine.resolve(&market_id, Some("no")).unwrap();
        assert_eq!(again.paid_out, 46.0);

        let mut payouts: Vec<_> = book
            .list_bets(&market_id)
            .unwrap()
            .into_iter()
            .map(|b| (b.side, b.payout))
            .collect();
        payouts.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        assert_eq!(
            payouts,
            vec![(Side::Yes, None), (Side::No, Some(11.0)), (Side::No, Some(35.0))]
        );
        assert!(matches!(
            engine.resolve(&market_id, Some("yes")),
            Err(LedgerError::AlreadyResolved { outcome: Side::No, .. })
        ));
    }

    #[test]
    fn test_settlement_clears_stray_payouts_on_losers() {
        let f = fixture();
        let winner = f.bet(10.0, Side::Yes);
        let loser = f.bet(5.0, Side::No);

        let mut stray = f
            .book
            .list_bets(&f.market_id)
            .unwrap()
            .into_iter()
            .find(|b| b.id == loser)
            .unwrap();
        stray.payout = Some(99.0);
        store::save(f.engine.store.as_ref(), &bet_key(&loser), &stray).unwrap();

        f.engine.resolve(&f.market_id, Some("yes")).unwrap();

        assert_eq!(f.payout_of(&winner), Some(14.0));
        assert_eq!(f.payout_of(&loser), None);
    }
}
