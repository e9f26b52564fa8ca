// Error types for the market ledger

use thiserror::Error;

use crate::models::Side;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Faults raised by a ledger store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("record {key} is malformed: {reason}")]
    Codec { key: String, reason: String },
}

impl StoreError {
    pub fn codec(key: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Codec {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sled::Error> for StoreError {
    fn from(value: sled::Error) -> Self {
        StoreError::Unavailable(value.to_string())
    }
}

/// Every failure a core operation can report to its caller
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),
    #[error("Market {0} not found")]
    NotFound(String),
    #[error("Market {0} is not open for betting")]
    MarketClosed(String),
    #[error("Market {market_id} already resolved to {outcome}")]
    AlreadyResolved { market_id: String, outcome: Side },
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }
}

/// Invalid process configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
