use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::{
    auth::bearer_token,
    error::{ApiError, AuthError},
    models::auth::Identity,
    state::AppState,
};

/// Guards `/admin` routes with the configured admin token, given either bare
/// or as a bearer credential.
pub async fn admin_auth(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.strip_prefix("Bearer ").unwrap_or(h));

    if presented == Some(state.admin_token.as_str()) {
        Ok(next.run(req).await)
    } else {
        Err(ApiError::Unauthorized(AuthError::Rejected))
    }
}

/// The user behind the request's bearer token.
pub struct AuthUser(pub Identity);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(None, &parts.headers)?;
        let identity = state.authenticator.authenticate(&token, None).await?;
        Ok(Self(identity))
    }
}
