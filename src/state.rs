use std::sync::Arc;

use chrono::Duration;
use sqlx::SqlitePool;

use crate::config::{AppConfig, TradingPolicy};
use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::services::credentials::CredentialStore;
use crate::services::failure_cache::FailureCache;
use crate::services::session_service::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub price_provider: Arc<dyn PriceProvider>,
    pub failure_cache: FailureCache,
    pub credentials: CredentialStore,
    pub sessions: SessionManager,
    pub trading: TradingPolicy,
}

impl AppState {
    pub fn new(pool: SqlitePool, price_provider: Arc<dyn PriceProvider>, config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            pool,
            price_provider,
            failure_cache: FailureCache::new(),
            credentials: CredentialStore::new(&config.hashing)?,
            sessions: SessionManager::new(&config.jwt_secret, Duration::hours(config.session_ttl_hours)),
            trading: config.trading,
        })
    }
}
