use futures::stream::BoxStream;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::models::{NewTrade, Trade};

const TRADE_COLUMNS: &str =
    "id, account_id, symbol, company, shares, price, total, status, trade_type, executed_at";

pub async fn insert<'e, E>(executor: E, trade: &NewTrade) -> Result<Trade, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "INSERT INTO trades (account_id, symbol, company, shares, price, total, status, trade_type, executed_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {}",
        TRADE_COLUMNS
    );
    sqlx::query_as::<_, Trade>(&sql)
        .bind(trade.account_id)
        .bind(&trade.symbol)
        .bind(&trade.company)
        .bind(trade.shares)
        .bind(trade.price)
        .bind(trade.total)
        .bind(trade.status)
        .bind(trade.trade_type)
        .bind(trade.executed_at)
        .fetch_one(executor)
        .await
}

/// Inserts a purchase only if the account's uncommitted cash covers its total.
/// Returns `None` when the check fails; the check and the insert are one statement.
pub async fn insert_purchase_if_funded(pool: &SqlitePool, trade: &NewTrade) -> Result<Option<Trade>, sqlx::Error> {
    let sql = format!(
        "INSERT INTO trades (account_id, symbol, company, shares, price, total, status, trade_type, executed_at)
         SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9
         WHERE (SELECT cash FROM accounts WHERE id = ?1)
             - (SELECT COALESCE(SUM(total), 0.0) FROM trades WHERE account_id = ?1 AND status = 'Yours')
             >= ?6
         RETURNING {}",
        TRADE_COLUMNS
    );
    sqlx::query_as::<_, Trade>(&sql)
        .bind(trade.account_id)
        .bind(&trade.symbol)
        .bind(&trade.company)
        .bind(trade.shares)
        .bind(trade.price)
        .bind(trade.total)
        .bind(trade.status)
        .bind(trade.trade_type)
        .bind(trade.executed_at)
        .fetch_optional(pool)
        .await
}

/// Cash minus the cost of every held lot, `None` for an unknown account.
pub async fn available_cash(pool: &SqlitePool, account_id: i64) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        "SELECT a.cash - COALESCE(
             (SELECT SUM(t.total) FROM trades t WHERE t.account_id = a.id AND t.status = 'Yours'),
             0.0)
         FROM accounts a
         WHERE a.id = ?"
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_held(pool: &SqlitePool, account_id: i64) -> Result<Vec<Trade>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM trades
         WHERE account_id = ? AND status = 'Yours'
         ORDER BY id",
        TRADE_COLUMNS
    );
    sqlx::query_as::<_, Trade>(&sql)
        .bind(account_id)
        .fetch_all(pool)
        .await
}

/// Oldest held lot with exactly this symbol and share count.
pub async fn find_matching_lot(
    pool: &SqlitePool,
    account_id: i64,
    symbol: &str,
    shares: i64,
) -> Result<Option<Trade>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM trades
         WHERE account_id = ? AND symbol = ? AND shares = ? AND status = 'Yours'
         ORDER BY id
         LIMIT 1",
        TRADE_COLUMNS
    );
    sqlx::query_as::<_, Trade>(&sql)
        .bind(account_id)
        .bind(symbol)
        .bind(shares)
        .fetch_optional(pool)
        .await
}

/// Marks a lot `Gone` if it is still held and returns it; `None` if another
/// request got there first.
pub async fn claim_lot<'e, E>(executor: E, lot_id: i64) -> Result<Option<Trade>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "UPDATE trades SET status = 'Gone'
         WHERE id = ? AND status = 'Yours'
         RETURNING {}",
        TRADE_COLUMNS
    );
    sqlx::query_as::<_, Trade>(&sql)
        .bind(lot_id)
        .fetch_optional(executor)
        .await
}

pub fn stream_for_account(pool: &SqlitePool, account_id: i64) -> BoxStream<'_, Result<Trade, sqlx::Error>> {
    sqlx::query_as::<_, Trade>(
        "SELECT id, account_id, symbol, company, shares, price, total, status, trade_type, executed_at
         FROM trades
         WHERE account_id = ?
         ORDER BY id"
    )
    .bind(account_id)
    .fetch(pool)
}

pub async fn held_symbols(pool: &SqlitePool, account_id: i64) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT symbol FROM trades
         WHERE account_id = ? AND status = 'Yours'
         GROUP BY symbol
         ORDER BY MIN(id)"
    )
    .bind(account_id)
    .fetch_all(pool)
    .await
}

pub async fn count_for_account(pool: &SqlitePool, account_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM trades WHERE account_id = ?")
        .bind(account_id)
        .fetch_one(pool)
        .await
}

pub async fn delete_for_account<'e, E>(executor: E, account_id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM trades WHERE account_id = ?")
        .bind(account_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
