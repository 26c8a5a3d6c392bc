use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::AppError;

// The cash anchor and credentials of one user.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub cash: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    pub username: String,
    pub cash: f64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub username: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

/// A deposit amount as submitted: either a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FundAmount {
    Number(f64),
    Text(String),
}

impl FundAmount {
    pub fn parse(&self) -> Result<f64, AppError> {
        let value = match self {
            FundAmount::Number(n) => *n,
            FundAmount::Text(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|_| AppError::InvalidAmount(format!("'{}' is not a number", raw)))?,
        };
        if !value.is_finite() || value <= 0.0 {
            return Err(AppError::InvalidAmount("Amount must be a positive number".into()));
        }
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
pub struct AddFundRequest {
    pub amount: FundAmount,
}
