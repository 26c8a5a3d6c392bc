use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

const CLEANUP_THRESHOLD: usize = 1024;

#[derive(Debug, Clone)]
pub struct FailureInfo {
    pub failed_at: DateTime<Utc>,
    pub kind: FailureKind,
}

impl FailureInfo {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.failed_at + self.kind.ttl()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    /// Matches the `Retry-After` sent to clients.
    RateLimited,
}

impl FailureKind {
    pub fn ttl(self) -> Duration {
        match self {
            FailureKind::NotFound => Duration::hours(24),
            FailureKind::RateLimited => Duration::seconds(60),
        }
    }
}

/// Symbols whose last lookup failed, so repeated requests for a bad ticker
/// do not spend provider quota. Transient provider errors are never cached.
#[derive(Clone, Default)]
pub struct FailureCache {
    cache: Arc<DashMap<String, FailureInfo>>,
}

impl FailureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded failure for `symbol`, if it is still within its TTL.
    pub fn is_failed(&self, symbol: &str) -> Option<FailureInfo> {
        let info = self.cache.get(symbol).map(|entry| entry.value().clone())?;
        if Utc::now() < info.expires_at() {
            return Some(info);
        }
        self.cache.remove(symbol);
        None
    }

    pub fn record_failure(&self, symbol: &str, kind: FailureKind) {
        self.record_failure_at(symbol, kind, Utc::now());
    }

    fn record_failure_at(&self, symbol: &str, kind: FailureKind, failed_at: DateTime<Utc>) {
        if self.cache.len() >= CLEANUP_THRESHOLD {
            self.cleanup_expired();
        }
        self.cache.insert(symbol.to_string(), FailureInfo { failed_at, kind });
    }

    pub fn clear(&self, symbol: &str) {
        self.cache.remove(symbol);
    }

    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        self.cache.retain(|_, info| now < info.expires_at());
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.cache.len()
    }
}
