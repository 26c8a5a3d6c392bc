use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{Quote, QuoteRequest};
use crate::services::quote_service;
use crate::services::session_service::Identity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/quote", post(get_quote))
}

pub async fn get_quote(
    State(state): State<AppState>,
    identity: Identity,
    Json(data): Json<QuoteRequest>,
) -> Result<Json<Quote>, AppError> {
    info!("POST /quote - {} looking up {}", identity.username, data.symbol);
    let quote = quote_service::lookup(state.price_provider.as_ref(), &state.failure_cache, &data.symbol)
        .await
        .map_err(|e| {
            match &e {
                AppError::RateLimited => warn!("Rate limited when quoting {}", data.symbol),
                _ => warn!("Quote failed for {}: {}", data.symbol, e),
            }
            e
        })?;
    Ok(Json(quote))
}
