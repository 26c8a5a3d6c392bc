use async_trait::async_trait;
use tracing::{info, warn};

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::Quote;

/// Asks the primary provider first and falls back to the secondary on any failure.
pub struct MultiProvider {
    primary: Box<dyn PriceProvider>,
    fallback: Box<dyn PriceProvider>,
}

impl MultiProvider {
    pub fn new(primary: Box<dyn PriceProvider>, fallback: Box<dyn PriceProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl PriceProvider for MultiProvider {
    async fn lookup(&self, symbol: &str) -> Result<Quote, PriceProviderError> {
        match self.primary.lookup(symbol).await {
            Ok(quote) => return Ok(quote),
            Err(PriceProviderError::RateLimited) => {
                info!("Primary provider rate limited for {}, trying fallback", symbol);
            },
            Err(e) => {
                warn!("Primary provider failed for {}: {}", symbol, e);
            },
        }

        self.fallback.lookup(symbol).await.map_err(|e| {
            warn!("Fallback provider failed for {}: {}", symbol, e);
            e
        })
    }
}
