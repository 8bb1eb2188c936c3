use axum::{Json, Router, http::StatusCode, routing::get};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;

use crate::api::routes;
use crate::state::AppState;
use crate::websocket::handler;

pub struct Server {
    state: Arc<AppState>,
    addr: String,
}

/// All routes of the relay: the two WebSocket entry points, the JSON API and a
/// JSON 404 fallback.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(handler::ws_handler))
        .route("/ws/chat", get(handler::ws_handler))
        .merge(routes::configure_api_routes(state.clone()))
        .fallback(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "NOT_FOUND" })),
            )
        })
        .with_state(state)
}

/// Serves the relay on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

impl Server {
    pub fn new(state: AppState, addr: impl Into<String>) -> Self {
        Self {
            state: Arc::new(state),
            addr: addr.into(),
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(&self.addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "relay listening");
        serve(listener, self.state).await?;
        Ok(())
    }
}
