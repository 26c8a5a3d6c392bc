use serde::{Deserialize, Serialize};

use crate::models::Trade;

/// A buy lot that is still held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub id: i64,
    pub symbol: String,
    pub company: String,
    pub shares: i64,
    pub price: f64,
    pub total: f64,
}

impl From<Trade> for Lot {
    fn from(trade: Trade) -> Self {
        Self {
            id: trade.id,
            symbol: trade.symbol,
            company: trade.company,
            shares: trade.shares,
            price: trade.price,
            total: trade.total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub lots: Vec<Lot>,
    /// Account cash minus the cost of every held lot.
    pub cash_remaining: f64,
    /// The account's cash balance as stored.
    pub value: f64,
}

impl PortfolioSummary {
    pub fn new(cash: f64, lots: Vec<Lot>) -> Self {
        let committed: f64 = lots.iter().map(|lot| lot.total).sum();
        Self {
            lots,
            cash_remaining: cash - committed,
            value: cash,
        }
    }
}
