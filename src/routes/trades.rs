use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::TryStreamExt;
use http::StatusCode;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{HistoryEntry, SaleReceipt, Trade, TradeRequest};
use crate::services::session_service::Identity;
use crate::services::trading_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/buy", post(buy))
        .route("/sell", get(sellable_symbols).post(sell))
        .route("/history", get(history))
}

pub async fn buy(
    State(state): State<AppState>,
    identity: Identity,
    Json(data): Json<TradeRequest>,
) -> Result<(StatusCode, Json<Trade>), AppError> {
    info!("POST /buy - {} buying {} {}", identity.username, data.shares, data.symbol);
    let trade = trading_service::buy(
        &state.pool,
        state.price_provider.as_ref(),
        &state.failure_cache,
        &state.trading,
        &identity,
        &data.symbol,
        data.shares,
    )
    .await
    .map_err(|e| {
        warn!("Buy failed for {}: {}", identity.username, e);
        e
    })?;
    Ok((StatusCode::CREATED, Json(trade)))
}

pub async fn sellable_symbols(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<String>>, AppError> {
    info!("GET /sell - Held symbols for {}", identity.username);
    let symbols = trading_service::held_symbols(&state.pool, &identity).await?;
    Ok(Json(symbols))
}

pub async fn sell(
    State(state): State<AppState>,
    identity: Identity,
    Json(data): Json<TradeRequest>,
) -> Result<Json<SaleReceipt>, AppError> {
    info!("POST /sell - {} selling {} {}", identity.username, data.shares, data.symbol);
    let receipt = trading_service::sell(
        &state.pool,
        state.price_provider.as_ref(),
        &state.failure_cache,
        &identity,
        &data.symbol,
        data.shares,
    )
    .await
    .map_err(|e| {
        warn!("Sell failed for {}: {}", identity.username, e);
        e
    })?;
    Ok(Json(receipt))
}

pub async fn history(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    info!("GET /history - Trades for {}", identity.username);
    let entries: Vec<HistoryEntry> = trading_service::history(&state.pool, &identity)
        .try_collect()
        .await?;
    Ok(Json(entries))
}
