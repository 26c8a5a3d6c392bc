use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::PortfolioSummary;
use crate::services::session_service::Identity;
use crate::services::trading_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_portfolio))
}

pub async fn get_portfolio(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<PortfolioSummary>, AppError> {
    info!("GET / - Portfolio for {}", identity.username);
    let portfolio = trading_service::list_portfolio(&state.pool, &identity)
        .await
        .map_err(|e| {
            error!("Failed to load portfolio for {}: {}", identity.username, e);
            e
        })?;
    Ok(Json(portfolio))
}
