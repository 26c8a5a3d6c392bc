use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Symbol cannot be found: {0}")]
    NotFound(String),
    #[error("Failed: Please double check the number of shares and the symbol of the company.")]
    NoMatchingLot,
    #[error("Username or password is incorrect!")]
    InvalidCredentials,
    #[error("Username is already registered")]
    DuplicateUser,
    #[error("Username does not exist")]
    UserNotFound,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient funds: {required:.2} required, {available:.2} available")]
    InsufficientFunds { required: f64, available: f64 },
    #[error("Rate limited by external provider")]
    RateLimited,
    #[error("External error: {0}")]
    External(String),
    #[error("Unauthorized")]
    Unauthorized,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::NoMatchingLot
            | AppError::InvalidAmount(_)
            | AppError::InsufficientFunds { .. }
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::DuplicateUser => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::External(_) => StatusCode::BAD_GATEWAY,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        match self {
            AppError::NotFound(_) => (status, "Symbol cannot be found!").into_response(),
            AppError::RateLimited => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (status, headers, "Rate limited").into_response()
            },
            AppError::Db(e) => {
                error!("Unhandled database error: {}", e);
                (status, "Internal server error").into_response()
            },
            AppError::Internal(msg) => {
                error!("Unhandled internal error: {}", msg);
                (status, "Internal server error").into_response()
            },
            AppError::External(msg) => {
                error!("Price provider error: {}", msg);
                (status, "Price lookup failed").into_response()
            },
            other => (status, other.to_string()).into_response(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        AppError::Db(value)
    }
}
