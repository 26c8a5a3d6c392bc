mod account;
mod portfolio;
mod quote;
mod trade;

pub use account::{Account, AccountBalance, AddFundRequest, ChangePasswordRequest, DeleteAccountRequest, ForgotPasswordRequest, FundAmount, LoginRequest, RegisterRequest, SessionToken};
pub use portfolio::{Lot, PortfolioSummary};
pub use quote::{Quote, QuoteRequest};
pub use trade::{HistoryEntry, LotStatus, NewTrade, SaleReceipt, Trade, TradeRequest, TradeType};
