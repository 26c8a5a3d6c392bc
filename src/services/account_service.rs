use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::TradingPolicy;
use crate::db::{account_queries, trade_queries};
use crate::errors::AppError;
use crate::models::{AccountBalance, FundAmount, SessionToken};
use crate::services::credentials::CredentialStore;
use crate::services::session_service::{Identity, SessionManager};

fn require_non_blank(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Creates an account funded with the policy's starting cash. Does not log in.
pub async fn register(
    pool: &SqlitePool,
    credentials: &CredentialStore,
    policy: &TradingPolicy,
    email: &str,
    password: &str,
) -> Result<AccountBalance, AppError> {
    let username = email.trim();
    require_non_blank(username, "Email")?;
    require_non_blank(password, "Password")?;

    let hash = credentials.hash(password).await?;
    match account_queries::insert(pool, username, &hash, policy.starting_cash).await {
        Ok(account) => {
            info!("Registered account {} ({})", account.id, account.username);
            Ok(AccountBalance {
                username: account.username,
                cash: account.cash,
            })
        },
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(AppError::DuplicateUser),
        Err(e) => Err(AppError::Db(e)),
    }
}

pub async fn login(
    pool: &SqlitePool,
    credentials: &CredentialStore,
    sessions: &SessionManager,
    username: &str,
    password: &str,
) -> Result<SessionToken, AppError> {
    let account = account_queries::find_by_username(pool, username.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !credentials.verify(&account.password_hash, password).await? {
        return Err(AppError::InvalidCredentials);
    }

    info!("{} logged in", account.username);
    sessions.issue(&account)
}

/// Ends the presented session, if there is one.
pub fn logout(sessions: &SessionManager, identity: Option<&Identity>) {
    if let Some(identity) = identity {
        sessions.revoke(identity);
        info!("{} logged out", identity.username);
    }
}

pub async fn change_password(
    pool: &SqlitePool,
    credentials: &CredentialStore,
    identity: &Identity,
    current_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let account = account_queries::fetch_one(pool, identity.account_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !credentials.verify(&account.password_hash, current_password).await? {
        return Err(AppError::InvalidCredentials);
    }
    require_non_blank(new_password, "New password")?;

    let hash = credentials.hash(new_password).await?;
    account_queries::update_password_hash(pool, account.id, &hash).await?;
    info!("{} changed their password", account.username);
    Ok(())
}

/// Self-service reset. There is no out-of-band verification step: anyone who
/// knows a username can set its password.
pub async fn forgot_password(
    pool: &SqlitePool,
    credentials: &CredentialStore,
    username: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let account = account_queries::find_by_username(pool, username.trim())
        .await?
        .ok_or(AppError::UserNotFound)?;
    require_non_blank(new_password, "New password")?;

    let hash = credentials.hash(new_password).await?;
    account_queries::update_password_hash(pool, account.id, &hash).await?;
    warn!("Password for {} reset without identity verification", account.username);
    Ok(())
}

pub async fn add_fund(pool: &SqlitePool, identity: &Identity, amount: &FundAmount) -> Result<AccountBalance, AppError> {
    let amount = amount.parse()?;
    let cash = account_queries::adjust_cash(pool, identity.account_id, amount)
        .await?
        .ok_or(AppError::Unauthorized)?;

    info!("{} added {:.2}, balance {:.2}", identity.username, amount, cash);
    Ok(AccountBalance {
        username: identity.username.clone(),
        cash,
    })
}

pub async fn balance(pool: &SqlitePool, identity: &Identity) -> Result<AccountBalance, AppError> {
    let account = account_queries::fetch_one(pool, identity.account_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(AccountBalance {
        username: account.username,
        cash: account.cash,
    })
}

/// Removes the account and all of its trades, then ends the session.
pub async fn delete_account(
    pool: &SqlitePool,
    credentials: &CredentialStore,
    sessions: &SessionManager,
    identity: &Identity,
    password: &str,
) -> Result<(), AppError> {
    let account = account_queries::fetch_one(pool, identity.account_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !credentials.verify(&account.password_hash, password).await? {
        return Err(AppError::InvalidCredentials);
    }

    let mut tx = pool.begin().await?;
    let trades = trade_queries::delete_for_account(&mut *tx, account.id).await?;
    account_queries::delete(&mut *tx, account.id).await?;
    tx.commit().await?;

    sessions.revoke(identity);
    info!("Deleted account {} and {} trades", account.username, trades);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::models::{NewTrade, Quote};
    use crate::test_support::{account_with_cash, credentials, memory_pool};

    fn sessions() -> SessionManager {
        SessionManager::new("test-secret", Duration::hours(1))
    }

    async fn register_and_login(
        pool: &SqlitePool,
        creds: &CredentialStore,
        sessions: &SessionManager,
        username: &str,
        password: &str,
    ) -> Identity {
        register(pool, creds, &TradingPolicy::default(), username, password).await.unwrap();
        let token = login(pool, creds, sessions, username, password).await.unwrap();
        sessions.verify(&token.token).unwrap()
    }

    #[tokio::test]
    async fn register_then_login_succeeds() {
        let pool = memory_pool().await;
        let creds = credentials();
        let sessions = sessions();

        let balance = register(&pool, &creds, &TradingPolicy::default(), "alice@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(balance.cash, 10_000.0);

        let token = login(&pool, &creds, &sessions, "alice@example.com", "pw").await.unwrap();
        let identity = sessions.verify(&token.token).unwrap();
        assert_eq!(identity.username, "alice@example.com");
    }

    #[tokio::test]
    async fn wrong_password_or_unknown_user_is_invalid_credentials() {
        let pool = memory_pool().await;
        let creds = credentials();
        let sessions = sessions();
        register(&pool, &creds, &TradingPolicy::default(), "alice", "pw").await.unwrap();

        let err = login(&pool, &creds, &sessions, "alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
        let err = login(&pool, &creds, &sessions, "nobody", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let pool = memory_pool().await;
        let creds = credentials();
        register(&pool, &creds, &TradingPolicy::default(), "alice", "pw").await.unwrap();

        let err = register(&pool, &creds, &TradingPolicy::default(), " alice ", "other")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateUser));
    }

    #[tokio::test]
    async fn blank_registration_fields_are_rejected() {
        let pool = memory_pool().await;
        let creds = credentials();

        let err = register(&pool, &creds, &TradingPolicy::default(), "  ", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = register(&pool, &creds, &TradingPolicy::default(), "alice", "").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn change_password_requires_the_current_one() {
        let pool = memory_pool().await;
        let creds = credentials();
        let sessions = sessions();
        let alice = register_and_login(&pool, &creds, &sessions, "alice", "old").await;

        let err = change_password(&pool, &creds, &alice, "wrong", "new").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        change_password(&pool, &creds, &alice, "old", "new").await.unwrap();
        assert!(login(&pool, &creds, &sessions, "alice", "old").await.is_err());
        assert!(login(&pool, &creds, &sessions, "alice", "new").await.is_ok());
    }

    #[tokio::test]
    async fn forgot_password_for_unknown_user_changes_nothing() {
        let pool = memory_pool().await;
        let creds = credentials();
        let sessions = sessions();
        register(&pool, &creds, &TradingPolicy::default(), "bob", "pw").await.unwrap();
        let before = account_queries::find_by_username(&pool, "bob").await.unwrap().unwrap();

        let err = forgot_password(&pool, &creds, "alice", "newpass").await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));

        let after = account_queries::find_by_username(&pool, "bob").await.unwrap().unwrap();
        assert_eq!(before.password_hash, after.password_hash);
        assert!(login(&pool, &creds, &sessions, "bob", "pw").await.is_ok());
    }

    #[tokio::test]
    async fn forgot_password_resets_without_the_old_password() {
        let pool = memory_pool().await;
        let creds = credentials();
        let sessions = sessions();
        register(&pool, &creds, &TradingPolicy::default(), "alice", "forgotten").await.unwrap();

        forgot_password(&pool, &creds, "alice", "newpass").await.unwrap();
        assert!(login(&pool, &creds, &sessions, "alice", "newpass").await.is_ok());
    }

    #[tokio::test]
    async fn add_fund_accumulates_positive_amounts_only() {
        let pool = memory_pool().await;
        let alice = account_with_cash(&pool, "alice", 100.0).await;

        let balance = add_fund(&pool, &alice, &FundAmount::Text("50.25".into())).await.unwrap();
        assert_eq!(balance.cash, 150.25);
        let balance = add_fund(&pool, &alice, &FundAmount::Number(49.75)).await.unwrap();
        assert_eq!(balance.cash, 200.0);

        let err = add_fund(&pool, &alice, &FundAmount::Number(-10.0)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidAmount(_)));
        let err = add_fund(&pool, &alice, &FundAmount::Text("lots".into())).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidAmount(_)));

        assert_eq!(balance_of(&pool, &alice).await, 200.0);
    }

    async fn balance_of(pool: &SqlitePool, identity: &Identity) -> f64 {
        balance(pool, identity).await.unwrap().cash
    }

    #[tokio::test]
    async fn delete_account_requires_password_and_removes_everything() {
        let pool = memory_pool().await;
        let creds = credentials();
        let sessions = sessions();
        let token = {
            register(&pool, &creds, &TradingPolicy::default(), "alice", "pw").await.unwrap();
            login(&pool, &creds, &sessions, "alice", "pw").await.unwrap()
        };
        let alice = sessions.verify(&token.token).unwrap();
        let quote = Quote { name: "Apple Inc".into(), symbol: "AAPL".into(), price: 10.0 };
        trade_queries::insert(&pool, &NewTrade::purchase(alice.account_id, &quote, 2)).await.unwrap();
        assert_eq!(trade_queries::count_for_account(&pool, alice.account_id).await.unwrap(), 1);

        let err = delete_account(&pool, &creds, &sessions, &alice, "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
        assert!(sessions.verify(&token.token).is_ok());

        delete_account(&pool, &creds, &sessions, &alice, "pw").await.unwrap();
        assert!(account_queries::fetch_one(&pool, alice.account_id).await.unwrap().is_none());
        assert_eq!(trade_queries::count_for_account(&pool, alice.account_id).await.unwrap(), 0);
        assert!(matches!(sessions.verify(&token.token), Err(AppError::Unauthorized)));

        // the username is free again
        register(&pool, &creds, &TradingPolicy::default(), "alice", "pw2").await.unwrap();
    }

    #[tokio::test]
    async fn logout_revokes_only_when_a_session_is_present() {
        let pool = memory_pool().await;
        let creds = credentials();
        let sessions = sessions();
        let alice = register_and_login(&pool, &creds, &sessions, "alice", "pw").await;

        logout(&sessions, None);
        assert_eq!(sessions.revoked_count(), 0);

        logout(&sessions, Some(&alice));
        assert_eq!(sessions.revoked_count(), 1);
    }
}
