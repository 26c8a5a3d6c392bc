use futures::stream::{BoxStream, StreamExt};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::TradingPolicy;
use crate::db::{account_queries, trade_queries};
use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::{HistoryEntry, Lot, NewTrade, PortfolioSummary, SaleReceipt, Trade};
use crate::services::failure_cache::FailureCache;
use crate::services::quote_service;
use crate::services::session_service::Identity;

fn ensure_positive_shares(shares: i64) -> Result<(), AppError> {
    if shares <= 0 {
        return Err(AppError::InvalidAmount("Shares must be a positive whole number".into()));
    }
    Ok(())
}

pub async fn list_portfolio(pool: &SqlitePool, identity: &Identity) -> Result<PortfolioSummary, AppError> {
    let account = account_queries::fetch_one(pool, identity.account_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let lots = trade_queries::fetch_held(pool, account.id)
        .await?
        .into_iter()
        .map(Lot::from)
        .collect();
    Ok(PortfolioSummary::new(account.cash, lots))
}

/// Records a new lot at the live price. Cash is not debited; held lots are
/// accounted for through `cash_remaining` instead.
pub async fn buy(
    pool: &SqlitePool,
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    policy: &TradingPolicy,
    identity: &Identity,
    symbol: &str,
    shares: i64,
) -> Result<Trade, AppError> {
    ensure_positive_shares(shares)?;
    let quote = quote_service::lookup(provider, failure_cache, symbol).await?;
    let purchase = NewTrade::purchase(identity.account_id, &quote, shares);

    let trade = if policy.enforce_sufficient_funds {
        match trade_queries::insert_purchase_if_funded(pool, &purchase).await? {
            Some(trade) => trade,
            None => {
                let available = trade_queries::available_cash(pool, identity.account_id)
                    .await?
                    .ok_or(AppError::Unauthorized)?;
                warn!(
                    "Buy of {} {} by {} rejected: {:.2} required, {:.2} available",
                    shares, quote.symbol, identity.username, purchase.total, available
                );
                return Err(AppError::InsufficientFunds {
                    required: purchase.total,
                    available,
                });
            },
        }
    } else {
        match trade_queries::insert(pool, &purchase).await {
            Ok(trade) => trade,
            // the account was deleted under a still-valid session
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                return Err(AppError::Unauthorized);
            },
            Err(e) => return Err(AppError::Db(e)),
        }
    };

    info!(
        "{} bought {} {} at {:.2} (lot {})",
        identity.username, trade.shares, trade.symbol, trade.price, trade.id
    );
    Ok(trade)
}

/// Closes the oldest held lot with exactly `symbol` and `shares`. The lot
/// claim, the sell record and the cash update commit together.
pub async fn sell(
    pool: &SqlitePool,
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    identity: &Identity,
    symbol: &str,
    shares: i64,
) -> Result<SaleReceipt, AppError> {
    ensure_positive_shares(shares)?;
    let symbol = quote_service::normalize_symbol(symbol).ok_or(AppError::NoMatchingLot)?;

    let candidate = trade_queries::find_matching_lot(pool, identity.account_id, &symbol, shares)
        .await?
        .ok_or(AppError::NoMatchingLot)?;
    let quote = quote_service::lookup(provider, failure_cache, &candidate.symbol).await?;

    let mut tx = pool.begin().await?;

    let Some(lot) = trade_queries::claim_lot(&mut *tx, candidate.id).await? else {
        warn!("Lot {} was sold concurrently", candidate.id);
        return Err(AppError::NoMatchingLot);
    };

    let sale = NewTrade::sale(&lot, quote.price);
    trade_queries::insert(&mut *tx, &sale).await?;

    let proceeds = quote.price * lot.shares as f64;
    let difference = lot.total - proceeds;
    let cash = account_queries::adjust_cash(&mut *tx, identity.account_id, difference)
        .await?
        .ok_or(AppError::Unauthorized)?;

    tx.commit().await?;

    info!(
        "{} sold {} {} at {:.2} (lot {}), cash now {:.2}",
        identity.username, lot.shares, lot.symbol, quote.price, lot.id, cash
    );
    Ok(SaleReceipt {
        lot_id: lot.id,
        symbol: lot.symbol,
        shares: lot.shares,
        price: quote.price,
        proceeds,
        difference,
        cash,
    })
}

/// Every trade of the account in insertion order. Each call runs a new query.
pub fn history<'a>(pool: &'a SqlitePool, identity: &Identity) -> BoxStream<'a, Result<HistoryEntry, AppError>> {
    trade_queries::stream_for_account(pool, identity.account_id)
        .map(|row| row.map(HistoryEntry::from).map_err(AppError::from))
        .boxed()
}

/// Distinct symbols of held lots, in the order they were first bought.
pub async fn held_symbols(pool: &SqlitePool, identity: &Identity) -> Result<Vec<String>, AppError> {
    Ok(trade_queries::held_symbols(pool, identity.account_id).await?)
}
