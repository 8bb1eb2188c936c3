use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::{net::SocketAddr, sync::Arc};
use uuid::Uuid;

use super::{AccountDirectory, Authenticator};
use crate::{
    error::AuthError,
    models::auth::{Claims, Identity},
};

/// Verifies HS256 dashboard access tokens locally, then asks the account
/// directory whether the user is still active.
pub struct JwtAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
    accounts: Arc<dyn AccountDirectory>,
}

impl JwtAuthenticator {
    pub fn new(secret: &[u8], accounts: Arc<dyn AccountDirectory>) -> Self {
        let mut validation = Validation::default();
        validation.validate_nbf = true;
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            accounts,
        }
    }

    /// Signature, expiry and claim checks only.

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let user_id =
            Uuid::parse_str(&data.claims.user_id).map_err(|_| AuthError::InvalidUserId)?;

        Ok(Identity {
            user_id,
            username: data.claims.username,
        })
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(
        &self,
        token: &str,
        _peer: Option<SocketAddr>,
    ) -> Result<Identity, AuthError> {
        let identity = self.verify(token)?;
        if !self.accounts.is_active(identity.user_id).await? {
            tracing::info!(user_id = %identity.user_id, "token of inactive account refused");
            return Err(AuthError::Inactive);
        }
        Ok(identity)
    }
}

/// Signs a token with the claims the dashboard issues at login.
pub fn issue_token(
    secret: &[u8],
    user_id: Uuid,
    username: &str,
    role_id: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        user_id: user_id.to_string(),
        username: username.to_string(),
        role_id: role_id.to_string(),
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
        nbf: now.timestamp(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}
