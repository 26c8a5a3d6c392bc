use async_trait::async_trait;
use thiserror::Error;

use crate::models::Quote;

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("symbol not found")]
    NotFound,
}

/// Live market data source used by quotes, buys and sells.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Current name, canonical symbol and price for `symbol`.
    async fn lookup(&self, symbol: &str) -> Result<Quote, PriceProviderError>;
}
