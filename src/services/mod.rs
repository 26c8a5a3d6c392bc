pub mod account_service;
pub mod credentials;
pub mod failure_cache;
pub mod quote_service;
pub mod session_service;
pub mod trading_service;
