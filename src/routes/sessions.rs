use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{AccountBalance, ForgotPasswordRequest, LoginRequest, RegisterRequest, SessionToken};
use crate::routes::MessageResponse;
use crate::services::account_service;
use crate::services::session_service::Identity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/register", post(register))
        .route("/forgotPassword", post(forgot_password))
}

pub async fn login(
    State(state): State<AppState>,
    Json(data): Json<LoginRequest>,
) -> Result<Json<SessionToken>, AppError> {
    info!("POST /login - {}", data.username);
    let token = account_service::login(&state.pool, &state.credentials, &state.sessions, &data.username, &data.password)
        .await
        .map_err(|e| {
            warn!("Login failed for {}: {}", data.username, e);
            e
        })?;
    Ok(Json(token))
}

pub async fn logout(
    State(state): State<AppState>,
    identity: Option<Identity>,
) -> Json<MessageResponse> {
    info!("GET /logout");
    account_service::logout(&state.sessions, identity.as_ref());
    Json(MessageResponse::new("Logged out!"))
}

pub async fn register(
    State(state): State<AppState>,
    Json(data): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountBalance>), AppError> {
    info!("POST /register - {}", data.email);
    let account = account_service::register(&state.pool, &state.credentials, &state.trading, &data.email, &data.password)
        .await
        .map_err(|e| {
            warn!("Registration failed for {}: {}", data.email, e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(data): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    info!("POST /forgotPassword - {}", data.username);
    account_service::forgot_password(&state.pool, &state.credentials, &data.username, &data.new_password).await?;
    Ok(Json(MessageResponse::new("Your password has been updated.")))
}
