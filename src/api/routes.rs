use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use super::{handlers, middleware::admin_auth};
use crate::state::AppState;

pub fn configure_api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin = Router::new()
        .route("/stats", get(handlers::stats_handler))
        .route("/disconnect", post(handlers::disconnect_user))
        .route("/accounts/status", post(handlers::set_account_status))
        .route_layer(middleware::from_fn_with_state(state, admin_auth));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/chat/history/{user_id}", get(handlers::chat_history))
        .route("/api/chat/online", get(handlers::online_users))
        .nest("/admin", admin)
}
