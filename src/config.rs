use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};

/// Which market-data backend answers quote lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    TwelveData,
    AlphaVantage,
    /// Twelve Data first, Alpha Vantage when it fails.
    Multi,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "twelvedata" => Ok(ProviderKind::TwelveData),
            "alphavantage" => Ok(ProviderKind::AlphaVantage),
            "multi" => Ok(ProviderKind::Multi),
            other => Err(anyhow!(
                "Invalid PRICE_PROVIDER: {}. Must be 'alphavantage', 'twelvedata', or 'multi'",
                other
            )),
        }
    }
}

/// Business rules that are switchable per deployment.
#[derive(Debug, Clone, Copy)]
pub struct TradingPolicy {
    /// Reject buys whose total exceeds `cash - sum(held lot totals)`.
    pub enforce_sufficient_funds: bool,
    /// Cash credited to a freshly registered account.
    pub starting_cash: f64,
}

impl Default for TradingPolicy {
    fn default() -> Self {
        Self {
            enforce_sufficient_funds: true,
            starting_cash: 10_000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub price_provider: ProviderKind,
    pub twelvedata_api_key: Option<String>,
    pub alphavantage_api_key: Option<String>,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub trading: TradingPolicy,
    pub hashing: HashingConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Fails when the
    /// selected price provider has no API key.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let price_provider = get("PRICE_PROVIDER")
            .unwrap_or_else(|| "twelvedata".to_string())
            .parse::<ProviderKind>()?;

        let twelvedata_api_key = get("TWELVEDATA_API_KEY");
        let alphavantage_api_key = get("ALPHAVANTAGE_API_KEY");

        let needs_twelvedata = matches!(price_provider, ProviderKind::TwelveData | ProviderKind::Multi);
        let needs_alphavantage = matches!(price_provider, ProviderKind::AlphaVantage | ProviderKind::Multi);
        if needs_twelvedata && twelvedata_api_key.is_none() {
            bail!("TWELVEDATA_API_KEY not set");
        }
        if needs_alphavantage && alphavantage_api_key.is_none() {
            bail!("ALPHAVANTAGE_API_KEY not set");
        }

        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET not set")?;

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR is not a valid socket address")?;

        let defaults = TradingPolicy::default();
        let trading = TradingPolicy {
            enforce_sufficient_funds: parse_or(&get, "ENFORCE_SUFFICIENT_FUNDS", defaults.enforce_sufficient_funds)?,
            starting_cash: parse_or(&get, "STARTING_CASH", defaults.starting_cash)?,
        };
        if !trading.starting_cash.is_finite() || trading.starting_cash < 0.0 {
            bail!("STARTING_CASH must be a non-negative number");
        }

        let hashing_defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: parse_or(&get, "ARGON2_MEMORY_KIB", hashing_defaults.memory_kib)?,
            iterations: parse_or(&get, "ARGON2_ITERATIONS", hashing_defaults.iterations)?,
        };

        let session_ttl_hours: i64 = parse_or(&get, "SESSION_TTL_HOURS", 12)?;
        if session_ttl_hours <= 0 {
            bail!("SESSION_TTL_HOURS must be positive");
        }

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "sqlite://tradesim.db".to_string()),
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 5)?,
            bind_addr,
            price_provider,
            twelvedata_api_key,
            alphavantage_api_key,
            jwt_secret,
            session_ttl_hours,
            trading,
            hashing,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}
