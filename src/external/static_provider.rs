use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::Quote;

/// In-memory quote table for offline runs and tests. Prices can be moved
/// while the provider is shared.
#[derive(Default)]
pub struct StaticPriceProvider {
    quotes: RwLock<HashMap<String, Quote>>,
    calls: AtomicUsize,
}

impl StaticPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quotes<'a, I>(quotes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, f64)>,
    {
        let provider = Self::new();
        for (symbol, name, price) in quotes {
            provider.set_quote(symbol, name, price);
        }
        provider
    }

    pub fn set_quote(&self, symbol: &str, name: &str, price: f64) {
        let symbol = symbol.to_uppercase();
        self.quotes.write().insert(
            symbol.clone(),
            Quote { name: name.to_string(), symbol, price },
        );
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        if let Some(quote) = self.quotes.write().get_mut(&symbol.to_uppercase()) {
            quote.price = price;
        }
    }

    /// Number of lookups served so far, hits and misses alike.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PriceProvider for StaticPriceProvider {
    async fn lookup(&self, symbol: &str) -> Result<Quote, PriceProviderError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.quotes
            .read()
            .get(&symbol.to_uppercase())
            .cloned()
            .ok_or(PriceProviderError::NotFound)
    }
}
