use async_trait::async_trait;
use reqwest::Client;
use std::{net::SocketAddr, time::Duration};

use super::Authenticator;
use crate::{
    error::AuthError,
    models::auth::{AuthResponse, Identity},
    utils::cache::AuthCache,
};

const API_TIMEOUT: Duration = Duration::from_secs(2);

/// Delegates token checks to the dashboard API over HTTP.
///
/// The endpoint receives `{"token", "ip"}` and answers with
/// `{"ok", "user_id", "username", "is_active"}`. Both accepted and refused
/// verdicts are cached for a short while; transport failures are not.
pub struct RemoteAuthenticator {
    http_client: Client,
    api_endpoint: String,
    cache: AuthCache,
}

impl RemoteAuthenticator {
    pub fn new(api_endpoint: String) -> Self {
        Self {
            http_client: Client::new(),
            api_endpoint,
            cache: AuthCache::default(),
        }
    }

    async fn ask(&self, token: &str, peer: Option<SocketAddr>) -> Result<Identity, AuthError> {
        let resp = self
            .http_client
            .post(&self.api_endpoint)
            .json(&serde_json::json!({
                "token": token,
                "ip": peer.map(|p| p.ip().to_string()),
            }))
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))?;

        let auth = resp
            .json::<AuthResponse>()
            .await
            .map_err(|e| AuthError::Upstream(format!("failed to parse auth response: {}", e)))?;

        if !auth.ok {
            return Err(AuthError::Rejected);
        }
        if !auth.is_active {
            return Err(AuthError::Inactive);
        }
        let user_id = auth.user_id.ok_or(AuthError::InvalidUserId)?;

        Ok(Identity {
            user_id,
            username: auth.username,
        })
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    async fn authenticate(
        &self,
        token: &str,
        peer: Option<SocketAddr>,
    ) -> Result<Identity, AuthError> {
        if let Some(verdict) = self.cache.read(token).await {
            return verdict;
        }

        let verdict = self.ask(token, peer).await;
        if !matches!(verdict, Err(AuthError::Upstream(_))) {
            self.cache.write(token.to_string(), verdict.clone()).await;
        }
        verdict
    }
}
