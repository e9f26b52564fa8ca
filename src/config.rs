use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3003;
pub const DEFAULT_DATA_DIR: &str = "data/ledger";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sled,
}

/// Process configuration, read from the environment (and `.env`)
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub data_dir: PathBuf,
    /// Degrade to an in-memory store when the primary store is unreachable
    pub store_fallback: bool,
    pub seed_demo_markets: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            store_backend: StoreBackend::Memory,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            store_fallback: true,
            seed_demo_markets: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("BIND_ADDR") {
            config.bind_addr = raw.parse().map_err(|e| invalid("BIND_ADDR", &raw, e))?;
        }
        if let Some(raw) = lookup("PORT") {
            config.port = raw.parse().map_err(|e| invalid("PORT", &raw, e))?;
        }
        if let Some(raw) = lookup("LEDGER_STORE") {
            config.store_backend = match raw.to_ascii_lowercase().as_str() {
                "memory" => StoreBackend::Memory,
                "sled" => StoreBackend::Sled,
                _ => return Err(invalid("LEDGER_STORE", &raw, "expected memory or sled")),
            };
        }
        if let Some(raw) = lookup("LEDGER_DATA_DIR") {
            config.data_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("LEDGER_STORE_FALLBACK") {
            config.store_fallback = parse_flag("LEDGER_STORE_FALLBACK", &raw)?;
        }
        if let Some(raw) = lookup("SEED_DEMO_MARKETS") {
            config.seed_demo_markets = parse_flag("SEED_DEMO_MARKETS", &raw)?;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(key, raw, "expected true or false")),
    }
}

fn invalid(key: &'static str, value: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
