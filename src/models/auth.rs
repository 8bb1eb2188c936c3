use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// Who a connection belongs to, as established by the authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

/// Reply expected from the remote auth endpoint.
#[derive(Clone, Deserialize)]
pub struct AuthResponse {
    pub ok: bool,
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// JWT claims carried by dashboard access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub role_id: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
}
