use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUser {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientStats {
    pub id: Arc<str>,
    pub user_id: Uuid,
    pub username: String,
    pub ip: Option<SocketAddr>,
    pub user_agent: Option<String>,
    pub connected_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct DisconnectPayload {
    pub id: Arc<str>,
}

#[derive(Deserialize)]
pub struct AccountStatusPayload {
    pub user_id: Uuid,
    pub is_active: bool,
}
