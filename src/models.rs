// Data models for the MoltyMarket prediction ledger

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::market_resolve::pool_share::UNINFORMED_PRICE;

/// Side of a binary market. Doubles as the resolved outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    /// Accepts exactly "yes" or "no"
    pub fn parse(raw: &str) -> Option<Side> {
        match raw {
            "yes" => Some(Side::Yes),
            "no" => Some(Side::No),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Yes => "yes",
            Side::No => "no",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    Open,
    Resolved,
}

/// Advisory label carried over from the event/price split of the public API
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    #[default]
    Event,
    Price,
}

/// A yes/no proposition open for staking until resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: MarketKind,
    pub status: MarketStatus,
    /// Unset (null) until resolution
    #[serde(default)]
    pub outcome: Option<Side>,
    pub total_yes: f64,
    pub total_no: f64,
    pub yes_price: f64,
    pub no_price: f64,
    #[serde(default)]
    pub yes_votes: u64,
    #[serde(default)]
    pub no_votes: u64,
    pub created_at: DateTime<Utc>,
    /// Advisory only, never enforced
    pub end_date: DateTime<Utc>,
    pub creator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Part of the pool kept by the house at resolution (fee plus rounding dust)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_retained: Option<f64>,
}

impl Market {
    pub fn new(
        question: String,
        description: String,
        kind: MarketKind,
        end_date: DateTime<Utc>,
        creator: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            question,
            description,
            kind,
            status: MarketStatus::Open,
            outcome: None,
            total_yes: 0.0,
            total_no: 0.0,
            yes_price: UNINFORMED_PRICE,
            no_price: UNINFORMED_PRICE,
            yes_votes: 0,
            no_votes: 0,
            created_at: Utc::now(),
            end_date,
            creator,
            resolved_at: None,
            house_retained: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == MarketStatus::Open
    }

    /// Total stake collected on both sides
    pub fn pool(&self) -> f64 {
        self.total_yes + self.total_no
    }

    pub fn total_votes(&self) -> u64 {
        self.yes_votes + self.no_votes
    }
}

/// One participant's stake on one side of a market
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: String,
    pub market_id: String,
    pub amount: f64,
    pub side: Side,
    pub better: String,
    pub created_at: DateTime<Utc>,
    /// Only ever set on winning bets, once, at resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout: Option<f64>,
}

impl Bet {
    pub fn new(market_id: String, amount: f64, side: Side, better: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            market_id,
            amount,
            side,
            better,
            created_at: Utc::now(),
            payout: None,
        }
    }
}

/// Fills in "anonymous" for missing or blank attribution
pub fn attribution(raw: Option<String>) -> String {
    raw.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "anonymous".to_string())
}

// Request/Response structs

/// End dates arrive either as epoch milliseconds or as a date string
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum EndDateInput {
    Millis(i64),
    Text(String),
}

impl EndDateInput {
    /// Accepts RFC 3339 timestamps, bare `YYYY-MM-DD` dates (midnight UTC)
    /// and epoch milliseconds
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            EndDateInput::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            EndDateInput::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
                    return Some(ts.with_timezone(&Utc));
                }
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| Utc.from_utc_datetime(&naive))
            }
        }
    }
}

impl From<DateTime<Utc>> for EndDateInput {
    fn from(value: DateTime<Utc>) -> Self {
        EndDateInput::Text(value.to_rfc3339())
    }
}

/// POST /api/v1/markets request body
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub end_date: Option<EndDateInput>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<MarketKind>,
}

impl CreateMarketRequest {
    pub fn new(question: impl Into<String>, end_date: impl Into<EndDateInput>) -> Self {
        Self {
            question: Some(question.into()),
            end_date: Some(end_date.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn with_kind(mut self, kind: MarketKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// POST /api/v1/markets/:id/bets request body
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlaceBetRequest {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub better: Option<String>,
}

impl PlaceBetRequest {
    pub fn new(amount: f64, side: Side) -> Self {
        Self {
            amount: Some(amount),
            side: Some(side.as_str().to_string()),
            better: None,
        }
    }

    pub fn by(mut self, better: impl Into<String>) -> Self {
        self.better = Some(better.into());
        self
    }
}

/// POST /api/v1/markets/:id/resolve request body
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub outcome: Option<String>,
}

/// POST /api/v1/markets/:id/vote request body
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub choice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MarketListResponse {
    pub markets: Vec<Market>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct MarketResponse {
    pub market: Market,
}

#[derive(Debug, Serialize)]
pub struct PlaceBetResponse {
    pub bet: Bet,
    pub market: Market,
}

#[derive(Debug, Serialize)]
pub struct BetListResponse {
    pub bets: Vec<Bet>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub market: Market,
    pub total_winners: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub market: Market,
    pub total_votes: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub markets: usize,
    pub bets: usize,
    pub store: &'static str,
    pub timestamp: DateTime<Utc>,
}
