use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::{
        middleware::AuthUser,
        types::{ApiResponse, ApiResult, api_response},
    },
    error::ApiError,
    models::{
        chat::StoredMessage,
        client::{AccountStatusPayload, ClientStats, DisconnectPayload, OnlineUser},
    },
    state::AppState,
    store::HISTORY_LIMIT,
};

#[derive(Serialize)]
pub struct Stats {
    pub online_users: Vec<OnlineUser>,
    pub clients: Vec<ClientStats>,
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<Stats> {
    let online_users = state.hub.online_users().await;
    let clients = state.hub.connections().await;

    Json(Stats {
        online_users,
        clients,
    })
}

pub async fn disconnect_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DisconnectPayload>,
) -> Result<StatusCode, ApiError> {
    if state.hub.disconnect(payload.id.clone()).await {
        tracing::info!(connection_id = %payload.id, "connection disconnected by admin");
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::NotFound)
    }
}

/// Marks an account active or inactive. Deactivation also closes the user's
/// open connections.
pub async fn set_account_status(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AccountStatusPayload>,
) -> StatusCode {
    state
        .accounts
        .set_active(payload.user_id, payload.is_active)
        .await;

    if !payload.is_active {
        for client in state.hub.connections().await {
            if client.user_id == payload.user_id {
                state.hub.disconnect(client.id).await;
            }
        }
    }

    tracing::info!(user_id = %payload.user_id, is_active = payload.is_active, "account status changed");
    StatusCode::OK
}

/// Up to 100 messages between the caller and `user_id`, oldest first.
pub async fn chat_history(
    AuthUser(me): AuthUser,
    State(state): State<Arc<AppState>>,
    other: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResult<Vec<StoredMessage>>, ApiError> {
    let Path(other) = other.map_err(|_| ApiError::BadRequest)?;
    let history = state
        .store
        .history(me.user_id, other, HISTORY_LIMIT)
        .await
        .inspect_err(|e| tracing::error!(user_id = %me.user_id, error = %e, "history query failed"))?;

    Ok(api_response(Ok::<_, ApiError>(history)))
}

pub async fn online_users(
    AuthUser(_): AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<OnlineUser>> {
    ApiResult(ApiResponse::success(state.hub.online_users().await))
}
