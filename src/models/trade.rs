use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Quote;

/// Whether a buy lot is still held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum LotStatus {
    Yours,
    Gone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum TradeType {
    Bought,
    Sold,
}

// One buy or sell event. Buys carry positive shares, sells negative.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trade {
    pub id: i64,
    pub account_id: i64,
    pub symbol: String,
    pub company: String,
    pub shares: i64,
    pub price: f64,
    pub total: f64,
    pub status: LotStatus,
    pub trade_type: TradeType,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTrade {
    pub account_id: i64,
    pub symbol: String,
    pub company: String,
    pub shares: i64,
    pub price: f64,
    pub total: f64,
    pub status: LotStatus,
    pub trade_type: TradeType,
    pub executed_at: DateTime<Utc>,
}

impl NewTrade {
    pub fn purchase(account_id: i64, quote: &Quote, shares: i64) -> Self {
        Self {
            account_id,
            symbol: quote.symbol.clone(),
            company: quote.name.clone(),
            shares,
            price: quote.price,
            total: quote.price * shares as f64,
            status: LotStatus::Yours,
            trade_type: TradeType::Bought,
            executed_at: Utc::now(),
        }
    }

    /// Sell record closing `lot` at `price`.
    pub fn sale(lot: &Trade, price: f64) -> Self {
        let shares = -lot.shares;
        Self {
            account_id: lot.account_id,
            symbol: lot.symbol.clone(),
            company: lot.company.clone(),
            shares,
            price,
            total: price * shares as f64,
            status: LotStatus::Gone,
            trade_type: TradeType::Sold,
            executed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub symbol: String,
    pub shares: i64,
    pub price: f64,
    pub transacted: DateTime<Utc>,
    pub trade_type: TradeType,
}

impl From<Trade> for HistoryEntry {
    fn from(trade: Trade) -> Self {
        Self {
            symbol: trade.symbol,
            shares: trade.shares,
            price: trade.price,
            transacted: trade.executed_at,
            trade_type: trade.trade_type,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    pub symbol: String,
    pub shares: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub lot_id: i64,
    pub symbol: String,
    pub shares: i64,
    pub price: f64,
    pub proceeds: f64,
    /// Lot cost minus proceeds, the amount applied to cash.
    pub difference: f64,
    pub cash: f64,
}
