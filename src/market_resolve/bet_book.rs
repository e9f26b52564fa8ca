use std::sync::Arc;
use tracing::{debug, info};

use super::pool_share::{self, MIN_BET_AMOUNT};
use super::{bet_key, market_bets_key, market_key, sort_newest_first, MarketLocks, MARKET_INDEX_KEY};
use crate::error::{LedgerError, Result};
use crate::models::{attribution, Bet, Market, PlaceBetRequest, Side};
use crate::store::{self, LedgerStore};

/// Records stakes against markets and reprices them after every stake
pub struct BetBook {
    store: Arc<dyn LedgerStore>,
    locks: Arc<MarketLocks>,
}

impl BetBook {
    pub fn new(store: Arc<dyn LedgerStore>, locks: Arc<MarketLocks>) -> Self {
        Self { store, locks }
    }

    /// Place a bet on an open market.
    ///
    /// Checks run in order: market exists, market is open, amount is at
    /// least [`MIN_BET_AMOUNT`], side is "yes" or "no". The whole
    /// read-modify-write runs under the market's lock.
    pub fn place_bet(&self, market_id: &str, request: PlaceBetRequest) -> Result<(Bet, Market)> {
        self.locks.hold(market_id, || -> Result<(Bet, Market)> {
            let mut market: Market = store::load(self.store.as_ref(), &market_key(market_id))?
                .ok_or_else(|| LedgerError::NotFound(market_id.to_string()))?;

            if !market.is_open() {
                return Err(LedgerError::MarketClosed(market_id.to_string()));
            }

            let amount = request
                .amount
                .filter(|a| a.is_finite() && *a >= MIN_BET_AMOUNT)
                .ok_or_else(|| {
                    LedgerError::validation(format!("Minimum bet {}", MIN_BET_AMOUNT))
                })?;

            let side = request
                .side
                .as_deref()
                .and_then(Side::parse)
                .ok_or_else(|| LedgerError::validation("Side must be yes or no"))?;

            // The pool must stay representable or the record cannot be reloaded
            if !(market.pool() + amount).is_finite() {
                return Err(LedgerError::validation("Bet would overflow the market pool"));
            }

            let bet = Bet::new(market_id.to_string(), amount, side, attribution(request.better));

            match side {
                Side::Yes => market.total_yes += amount,
                Side::No => market.total_no += amount,
            }
            let (yes_price, no_price) = pool_share::prices(market.total_yes, market.total_no);
            market.yes_price = yes_price;
            market.no_price = no_price;

            store::save(self.store.as_ref(), &bet_key(&bet.id), &bet)?;
            self.store.push_key(&market_bets_key(market_id), &bet.id)?;
            store::save(self.store.as_ref(), &market_key(market_id), &market)?;

            info!(
                "🎯 BET | {} staked {} on {} in {} | yes {:.3} / no {:.3}",
                bet.better, amount, side, market_id, yes_price, no_price
            );
            Ok((bet, market))
        })
    }

    /// All bets on a market, most recent first. Unknown markets have no bets.
    pub fn list_bets(&self, market_id: &str) -> Result<Vec<Bet>> {
        let mut bets = self.load_bets(market_id)?;
        sort_newest_first(&mut bets, |b| b.created_at);
        Ok(bets)
    }

    /// Bets on a market in the order they were placed
    pub(crate) fn load_bets(&self, market_id: &str) -> Result<Vec<Bet>> {
        let ids = self.store.list_keys(&market_bets_key(market_id))?;
        let mut bets = Vec::with_capacity(ids.len());
        for id in &ids {
            match store::load::<Bet>(self.store.as_ref(), &bet_key(id))? {
                Some(bet) => bets.push(bet),
                None => debug!("market {} lists bet {} with no record", market_id, id),
            }
        }
        Ok(bets)
    }

    /// Total number of bets across every market
    pub fn count(&self) -> Result<usize> {
        let mut total = 0;
        for market_id in self.store.list_keys(MARKET_INDEX_KEY)? {
            total += self.store.list_keys(&market_bets_key(&market_id))?.len();
        }
        Ok(total)
    }
}
