use std::sync::OnceLock;

use regex::Regex;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::Quote;
use crate::services::failure_cache::{FailureCache, FailureKind};

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9.\-]{1,10}$").expect("symbol pattern is valid"))
}

/// Trimmed, upper-cased ticker, or `None` if it cannot be a ticker at all.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_uppercase();
    symbol_pattern().is_match(&symbol).then_some(symbol)
}

pub async fn lookup(
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    raw_symbol: &str,
) -> Result<Quote, AppError> {
    let symbol = normalize_symbol(raw_symbol).ok_or_else(|| AppError::NotFound(raw_symbol.trim().to_string()))?;

    if let Some(failure) = failure_cache.is_failed(&symbol) {
        info!("Skipping lookup for {} - cached {:?} until {}", symbol, failure.kind, failure.expires_at());
        return Err(match failure.kind {
            FailureKind::NotFound => AppError::NotFound(symbol),
            FailureKind::RateLimited => AppError::RateLimited,
        });
    }

    match provider.lookup(&symbol).await {
        Ok(quote) => {
            failure_cache.clear(&symbol);
            Ok(quote)
        },
        Err(PriceProviderError::NotFound) => {
            failure_cache.record_failure(&symbol, FailureKind::NotFound);
            Err(AppError::NotFound(symbol))
        },
        Err(PriceProviderError::RateLimited) => {
            warn!("Rate limited while looking up {}", symbol);
            failure_cache.record_failure(&symbol, FailureKind::RateLimited);
            Err(AppError::RateLimited)
        },
        Err(e) => {
            error!("Quote lookup failed for {}: {}", symbol, e);
            Err(AppError::External(e.to_string()))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::static_provider::StaticPriceProvider;

    #[test]
    fn symbols_are_normalized() {
        assert_eq!(normalize_symbol("  aapl ").as_deref(), Some("AAPL"));
        assert_eq!(normalize_symbol("brk.b").as_deref(), Some("BRK.B"));
        assert_eq!(normalize_symbol(""), None);
        assert_eq!(normalize_symbol("DROP TABLE"), None);
        assert_eq!(normalize_symbol("WAYTOOLONGSYMBOL"), None);
    }

    #[tokio::test]
    async fn lookup_returns_the_provider_quote() {
        let provider = StaticPriceProvider::with_quotes([("AAPL", "Apple Inc", 190.0)]);
        let cache = FailureCache::new();

        let quote = lookup(&provider, &cache, "aapl").await.unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.name, "Apple Inc");
    }

    #[tokio::test]
    async fn unknown_symbols_are_cached() {
        let provider = StaticPriceProvider::new();
        let cache = FailureCache::new();

        assert!(matches!(lookup(&provider, &cache, "ZZZZ").await, Err(AppError::NotFound(_))));
        assert!(matches!(lookup(&provider, &cache, "zzzz").await, Err(AppError::NotFound(_))));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_symbols_never_reach_the_provider() {
        let provider = StaticPriceProvider::new();
        let cache = FailureCache::new();

        assert!(matches!(lookup(&provider, &cache, "not a ticker").await, Err(AppError::NotFound(_))));
        assert_eq!(provider.calls(), 0);
    }

    /// Replays scripted results, then answers with a fixed quote.
    struct FlakyProvider {
        failures: parking_lot::Mutex<Vec<PriceProviderError>>,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl FlakyProvider {
        fn failing_with(failures: Vec<PriceProviderError>) -> Self {
            Self {
                failures: parking_lot::Mutex::new(failures),
                calls: std::sync::atomic::AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl PriceProvider for FlakyProvider {
        async fn lookup(&self, symbol: &str) -> Result<Quote, PriceProviderError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if let Some(err) = self.failures.lock().pop() {
                return Err(err);
            }
            Ok(Quote {
                name: "Apple Inc".to_string(),
                symbol: symbol.to_string(),
                price: 190.0,
            })
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried_on_the_next_lookup() {
        let provider = FlakyProvider::failing_with(vec![PriceProviderError::Network("timed out".into())]);
        let cache = FailureCache::new();

        assert!(matches!(lookup(&provider, &cache, "AAPL").await, Err(AppError::External(_))));
        let quote = lookup(&provider, &cache, "AAPL").await.unwrap();
        assert_eq!(quote.price, 190.0);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn rate_limits_block_the_symbol_for_about_a_minute() {
        let provider = FlakyProvider::failing_with(vec![PriceProviderError::RateLimited]);
        let cache = FailureCache::new();

        assert!(matches!(lookup(&provider, &cache, "AAPL").await, Err(AppError::RateLimited)));
        assert!(matches!(lookup(&provider, &cache, "AAPL").await, Err(AppError::RateLimited)));
        assert_eq!(provider.calls(), 1);

        let failure = cache.is_failed("AAPL").unwrap();
        assert!(failure.expires_at() <= chrono::Utc::now() + chrono::Duration::seconds(60));
    }

    #[tokio::test]
    async fn provider_failures_reach_clients_without_secrets() {
        use axum::response::IntoResponse;

        let provider = FlakyProvider::failing_with(vec![PriceProviderError::Network(
            "error sending request for url (https://api.twelvedata.com/quote?apikey=SUPERSECRETKEY123)".into(),
        )]);
        let cache = FailureCache::new();

        let err = lookup(&provider, &cache, "AAPL").await.unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_GATEWAY);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("SUPERSECRETKEY123"));
    }
}
