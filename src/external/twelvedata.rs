use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::external::rate_limiter::RateLimiter;
use crate::models::Quote;

const QUOTE_URL: &str = "https://api.twelvedata.com/quote";

pub struct TwelveDataProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: RateLimiter,
}

impl TwelveDataProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(QUOTE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            limiter: RateLimiter::new(3, 8),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TwelveDataQuoteResponse {
    symbol: Option<String>,
    name: Option<String>,
    close: Option<String>,

    // Error payloads: { "code": 404, "message": "...", "status": "error" }
    status: Option<String>,
    code: Option<u32>,
    message: Option<String>,
}

fn parse_quote(body: TwelveDataQuoteResponse) -> Result<Quote, PriceProviderError> {
    if body.status.as_deref() == Some("error") || body.code.is_some() {
        let msg = body.message.unwrap_or_default();
        return Err(match body.code {
            Some(404) => PriceProviderError::NotFound,
            Some(429) => PriceProviderError::RateLimited,
            _ if msg.contains("API rate limit") || msg.contains("credits") => PriceProviderError::RateLimited,
            _ if msg.contains("not found") => PriceProviderError::NotFound,
            _ => PriceProviderError::BadResponse(msg),
        });
    }

    let symbol = body.symbol.ok_or(PriceProviderError::NotFound)?;
    let price = body
        .close
        .ok_or_else(|| PriceProviderError::BadResponse("missing close price".into()))?
        .parse::<f64>()
        .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

    Ok(Quote {
        name: body.name.unwrap_or_else(|| symbol.clone()),
        symbol,
        price,
    })
}

#[async_trait]
impl PriceProvider for TwelveDataProvider {
    async fn lookup(&self, symbol: &str) -> Result<Quote, PriceProviderError> {
        let _guard = self.limiter.acquire().await?;
        debug!("Twelve Data quote request for {}", symbol);

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("symbol", symbol), ("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.without_url().to_string()))?;

        let body: TwelveDataQuoteResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.without_url().to_string()))?;

        parse_quote(body)
    }
}
