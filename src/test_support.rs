use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::config::HashingConfig;
use crate::db::{self, account_queries};
use crate::services::credentials::CredentialStore;
use crate::services::session_service::Identity;

pub async fn memory_pool() -> SqlitePool {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::migrate(&pool).await.unwrap();
    pool
}

pub fn credentials() -> CredentialStore {
    CredentialStore::new(&HashingConfig { memory_kib: 64, iterations: 1 }).unwrap()
}

/// An account with a placeholder hash, and an identity for it.
pub async fn account_with_cash(pool: &SqlitePool, username: &str, cash: f64) -> Identity {
    let account = account_queries::insert(pool, username, "---", cash).await.unwrap();
    Identity {
        account_id: account.id,
        username: account.username,
        session_id: format!("test-session-{}", account.id),
        expires_at: Utc::now() + Duration::hours(1),
    }
}
