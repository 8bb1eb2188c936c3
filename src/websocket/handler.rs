use axum::{
    extract::{ConnectInfo, Query, State, rejection::QueryRejection, ws::WebSocketUpgrade},
    http::{HeaderMap, header::USER_AGENT},
    response::Response,
};
use std::{net::SocketAddr, sync::Arc};

use crate::{
    auth::bearer_token,
    error::ApiError,
    models::auth::WsQuery,
    state::AppState,
    utils::id_generator::connection_id,
    websocket::connection::{self, Session},
};

/// `GET /ws?token=…` (or `Authorization: Bearer …`).
///
/// Everything that can refuse the peer happens before the upgrade, so a
/// refused peer never gets a connection or a registry entry.
pub async fn ws_handler(
    query: Result<Query<WsQuery>, QueryRejection>,
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::BadRequest)?;

    state.rate_limiter.check(addr.ip()).await?;

    let token = bearer_token(query.token.as_deref(), &headers)?;
    let identity = state
        .authenticator
        .authenticate(&token, Some(addr))
        .await
        .inspect_err(|e| tracing::warn!(ip = %addr, error = %e, "websocket auth failed"))?;

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let session = Session::new(
        connection_id(),
        identity,
        state.hub.clone(),
        state.store.clone(),
    );
    let limits = state.limits;

    Ok(ws
        .max_message_size(limits.max_message_size)
        .on_upgrade(move |socket| {
            connection::serve(socket, session, Some(addr), user_agent, limits)
        }))
}
