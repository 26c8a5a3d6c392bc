use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{AccountBalance, AddFundRequest, ChangePasswordRequest, DeleteAccountRequest};
use crate::routes::MessageResponse;
use crate::services::account_service;
use crate::services::session_service::Identity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addFund", get(get_balance).post(add_fund))
        .route("/changePassword", post(change_password))
        .route("/deleteAccount", post(delete_account))
}

pub async fn get_balance(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<AccountBalance>, AppError> {
    info!("GET /addFund - Balance for {}", identity.username);
    Ok(Json(account_service::balance(&state.pool, &identity).await?))
}

pub async fn add_fund(
    State(state): State<AppState>,
    identity: Identity,
    Json(data): Json<AddFundRequest>,
) -> Result<Json<AccountBalance>, AppError> {
    info!("POST /addFund - {}", identity.username);
    let balance = account_service::add_fund(&state.pool, &identity, &data.amount)
        .await
        .map_err(|e| {
            error!("Failed to add funds for {}: {}", identity.username, e);
            e
        })?;
    Ok(Json(balance))
}

pub async fn change_password(
    State(state): State<AppState>,
    identity: Identity,
    Json(data): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    info!("POST /changePassword - {}", identity.username);
    account_service::change_password(
        &state.pool,
        &state.credentials,
        &identity,
        &data.current_password,
        &data.new_password,
    )
    .await?;
    Ok(Json(MessageResponse::new("Your password has been updated.")))
}

pub async fn delete_account(
    State(state): State<AppState>,
    identity: Identity,
    Json(data): Json<DeleteAccountRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    info!("POST /deleteAccount - {}", identity.username);
    account_service::delete_account(&state.pool, &state.credentials, &state.sessions, &identity, &data.password).await?;
    Ok(Json(MessageResponse::new("Your account has been deleted. We'll miss you!")))
}
