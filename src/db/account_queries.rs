use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::models::Account;

pub async fn insert(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    cash: f64,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (username, password_hash, cash, created_at)
         VALUES (?, ?, ?, ?)
         RETURNING id, username, password_hash, cash, created_at"
    )
    .bind(username)
    .bind(password_hash)
    .bind(cash)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn fetch_one(pool: &SqlitePool, id: i64) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT id, username, password_hash, cash, created_at
         FROM accounts
         WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT id, username, password_hash, cash, created_at
         FROM accounts
         WHERE username = ?"
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn update_password_hash(pool: &SqlitePool, id: i64, password_hash: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE accounts SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Applies a relative change to the cash balance and returns the new balance,
/// or `None` when the account does not exist.
pub async fn adjust_cash<'e, E>(executor: E, id: i64, delta: f64) -> Result<Option<f64>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, f64>("UPDATE accounts SET cash = cash + ? WHERE id = ? RETURNING cash")
        .bind(delta)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn delete<'e, E>(executor: E, id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
