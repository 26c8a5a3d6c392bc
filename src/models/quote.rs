use serde::{Deserialize, Serialize};

/// Current market data for one ticker, as returned by a price provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub name: String,
    pub symbol: String,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub symbol: String,
}
