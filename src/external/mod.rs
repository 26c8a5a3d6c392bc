pub mod alphavantage;
pub mod multi_provider;
pub mod price_provider;
pub mod rate_limiter;
pub mod static_provider;
pub mod twelvedata;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::{AppConfig, ProviderKind};
use crate::external::alphavantage::AlphaVantageProvider;
use crate::external::multi_provider::MultiProvider;
use crate::external::price_provider::PriceProvider;
use crate::external::twelvedata::TwelveDataProvider;

/// Builds the configured price provider. Fails when its API key is missing.
pub fn build_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn PriceProvider>> {
    let twelvedata = || {
        config
            .twelvedata_api_key
            .clone()
            .map(TwelveDataProvider::new)
            .context("TWELVEDATA_API_KEY not set")
    };
    let alphavantage = || {
        config
            .alphavantage_api_key
            .clone()
            .map(AlphaVantageProvider::new)
            .context("ALPHAVANTAGE_API_KEY not set")
    };

    let provider: Arc<dyn PriceProvider> = match config.price_provider {
        ProviderKind::TwelveData => {
            info!("Using price provider: Twelve Data");
            Arc::new(twelvedata()?)
        },
        ProviderKind::AlphaVantage => {
            info!("Using price provider: Alpha Vantage");
            Arc::new(alphavantage()?)
        },
        ProviderKind::Multi => {
            info!("Using price provider: Twelve Data with Alpha Vantage fallback");
            Arc::new(MultiProvider::new(Box::new(twelvedata()?), Box::new(alphavantage()?)))
        },
    };
    Ok(provider)
}
