pub mod accounts;
pub mod jwt;
pub mod remote;

use async_trait::async_trait;
use axum::http::{HeaderMap, header::AUTHORIZATION};
use std::net::SocketAddr;

use crate::{error::AuthError, models::auth::Identity};

pub use accounts::{AccountDirectory, InMemoryAccountDirectory};
pub use jwt::JwtAuthenticator;
pub use remote::RemoteAuthenticator;

/// Maps a bearer credential to the user it belongs to.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(
        &self,
        token: &str,
        peer: Option<SocketAddr>,
    ) -> Result<Identity, AuthError>;
}

/// Picks the credential from `?token=` first, then `Authorization: Bearer`.
pub fn bearer_token(query_token: Option<&str>, headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(token) = query_token.filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(AuthError::MissingToken)
}
