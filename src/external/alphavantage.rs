use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::external::rate_limiter::RateLimiter;
use crate::models::Quote;

const QUERY_URL: &str = "https://www.alphavantage.co/query";

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: RateLimiter,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(QUERY_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            limiter: RateLimiter::new(1, 5),
        }
    }

    async fn query<T: DeserializeOwned + Send>(&self, params: &[(&str, &str)]) -> Result<T, PriceProviderError> {
        let _guard = self.limiter.acquire().await?;

        let mut query = params.to_vec();
        query.push(("apikey", self.api_key.as_str()));

        self.client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.without_url().to_string()))?
            .json::<T>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.without_url().to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct AvGlobalQuoteResponse {
    // An unknown symbol comes back as an empty object.
    #[serde(rename = "Global Quote")]
    global_quote: Option<AvGlobalQuote>,

    // Throttle responses: { "Note": "..." } or { "Information": "... rate limit ..." }
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvGlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvSearchResponse {
    #[serde(rename = "bestMatches", default)]
    best_matches: Vec<AvSearchMatch>,
}

#[derive(Debug, Deserialize)]
struct AvSearchMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
}

/// Symbol and price from a GLOBAL_QUOTE payload.
fn parse_global_quote(body: AvGlobalQuoteResponse) -> Result<(String, f64), PriceProviderError> {
    if body.note.is_some() {
        return Err(PriceProviderError::RateLimited);
    }
    if let Some(info) = body.information {
        if info.contains("rate limit") {
            return Err(PriceProviderError::RateLimited);
        }
        return Err(PriceProviderError::BadResponse(info));
    }
    if let Some(msg) = body.error_message {
        return Err(PriceProviderError::BadResponse(msg));
    }

    let quote = body.global_quote.ok_or(PriceProviderError::NotFound)?;
    let (Some(symbol), Some(price)) = (quote.symbol, quote.price) else {
        return Err(PriceProviderError::NotFound);
    };
    let price = price
        .parse::<f64>()
        .map_err(|e| PriceProviderError::Parse(e.to_string()))?;
    Ok((symbol, price))
}

fn company_name(search: AvSearchResponse, symbol: &str) -> Option<String> {
    search
        .best_matches
        .into_iter()
        .find(|m| m.symbol.eq_ignore_ascii_case(symbol))
        .map(|m| m.name)
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    async fn lookup(&self, symbol: &str) -> Result<Quote, PriceProviderError> {
        debug!("Alpha Vantage quote request for {}", symbol);
        let body: AvGlobalQuoteResponse = self
            .query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await?;
        let (symbol, price) = parse_global_quote(body)?;

        // GLOBAL_QUOTE has no company name; fall back to the symbol if search fails.
        let name = match self
            .query::<AvSearchResponse>(&[("function", "SYMBOL_SEARCH"), ("keywords", symbol.as_str())])
            .await
        {
            Ok(search) => company_name(search, &symbol),
            Err(e) => {
                debug!("Alpha Vantage name search failed for {}: {}", symbol, e);
                None
            },
        };

        Ok(Quote {
            name: name.unwrap_or_else(|| symbol.clone()),
            symbol,
            price,
        })
    }
}
