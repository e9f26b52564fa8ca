use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use super::pool_share;
use super::{market_key, sort_newest_first, MarketLocks, MARKET_INDEX_KEY};
use crate::error::{LedgerError, Result};
use crate::models::{attribution, CreateMarketRequest, Market, MarketKind, Side};
use crate::store::{self, LedgerStore};

/// Creates markets and answers lookups over them
pub struct MarketRegistry {
    store: Arc<dyn LedgerStore>,
    locks: Arc<MarketLocks>,
}

impl MarketRegistry {
    pub fn new(store: Arc<dyn LedgerStore>, locks: Arc<MarketLocks>) -> Self {
        Self { store, locks }
    }

    /// Create a new open market with 50/50 prices and no stake
    pub fn create(&self, request: CreateMarketRequest) -> Result<Market> {
        let question = request
            .question
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        let (question, end_date) = match (question, request.end_date) {
            (Some(question), Some(end_date)) => (question, end_date),
            _ => return Err(LedgerError::validation("Question and endDate required")),
        };
        let end_date = end_date
            .to_datetime()
            .ok_or_else(|| LedgerError::validation("endDate is not a valid date"))?;

        let market = Market::new(
            question,
            request.description.unwrap_or_default(),
            request.kind.unwrap_or_default(),
            end_date,
            attribution(request.creator),
        );

        store::save(self.store.as_ref(), &market_key(&market.id), &market)?;
        self.locks
            .hold(MARKET_INDEX_KEY, || self.store.push_key(MARKET_INDEX_KEY, &market.id))?;

        info!("📊 MARKET_CREATED | {} | {}", market.id, market.question);
        Ok(market)
    }

    pub fn get(&self, market_id: &str) -> Result<Market> {
        store::load(self.store.as_ref(), &market_key(market_id))?
            .ok_or_else(|| LedgerError::NotFound(market_id.to_string()))
    }

    /// Every market, most recently created first
    pub fn list(&self) -> Result<Vec<Market>> {
        let ids = self.store.list_keys(MARKET_INDEX_KEY)?;
        let mut markets = Vec::with_capacity(ids.len());
        for id in &ids {
            // Index entries without a record are skipped, not fatal
            match store::load::<Market>(self.store.as_ref(), &market_key(id))? {
                Some(market) => markets.push(market),
                None => debug!("index lists market {} with no record", id),
            }
        }
        sort_newest_first(&mut markets, |m| m.created_at);
        Ok(markets)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.store.list_keys(MARKET_INDEX_KEY)?.len())
    }

    /// Record a stake-free sentiment vote. Allowed whatever the market status.
    pub fn vote(&self, market_id: &str, choice: Option<&str>) -> Result<(Market, u64)> {
        let choice = choice
            .and_then(Side::parse)
            .ok_or_else(|| LedgerError::validation("Choice must be yes or no"))?;

        self.locks.hold(market_id, || -> Result<(Market, u64)> {
            let mut market = self.get(market_id)?;
            match choice {
                Side::Yes => market.yes_votes += 1,
                Side::No => market.no_votes += 1,
            }
            store::save(self.store.as_ref(), &market_key(market_id), &market)?;

            let total = market.total_votes();
            debug!("🗳️  VOTE | {} | {} ({} total)", market_id, choice, total);
            Ok((market, total))
        })
    }

    /// Populate an empty registry with demo markets. Returns how many were created.
    pub fn seed_defaults(&self) -> Result<usize> {
        if self.count()? > 0 {
            return Ok(0);
        }

        let now = Utc::now();
        // (question, description, kind, ends in, yes/no stake, yes/no votes)
        let defaults = [
            (
                "Will KingMolt get banned from Moltbook this week?",
                "Rumors are swirling about potential rule violations...",
                MarketKind::Event,
                Duration::days(1),
                (0.0, 0.0),
                (47, 23),
            ),
            (
                "Will BTC hit $105k by Feb 3?",
                "Price feed market - resolved manually by an operator",
                MarketKind::Price,
                Duration::days(1),
                (50_000.0, 27_000.0),
                (156, 89),
            ),
            (
                "Will Shellraiser win another agent battle this week?",
                "Shellraiser has been on a winning streak...",
                MarketKind::Event,
                Duration::days(2),
                (20_000.0, 30_000.0),
                (34, 41),
            ),
        ];

        for (question, description, kind, ends_in, (total_yes, total_no), (yes_votes, no_votes)) in
            defaults
        {
            let request = CreateMarketRequest::new(question, now + ends_in)
                .with_description(description)
                .with_kind(kind)
                .with_creator("system");
            let mut market = self.create(request)?;

            let (yes_price, no_price) = pool_share::prices(total_yes, total_no);
            market.total_yes = total_yes;
            market.total_no = total_no;
            market.yes_price = yes_price;
            market.no_price = no_price;
            market.yes_votes = yes_votes;
            market.no_votes = no_votes;
            self.locks.hold(&market.id, || {
                store::save(self.store.as_ref(), &market_key(&market.id), &market)
            })?;
        }

        info!("🌱 Seeded {} demo markets", defaults.len());
        Ok(defaults.len())
    }
}
