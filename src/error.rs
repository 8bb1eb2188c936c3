use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Reasons a bearer credential is refused before the socket is upgraded.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("token required")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("invalid user id in token")]
    InvalidUserId,
    #[error("user not found or inactive")]
    Inactive,
    #[error("authentication failed")]
    Rejected,
    #[error("auth endpoint error: {0}")]
    Upstream(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::InvalidToken(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("message store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("BAD_REQUEST")]
    BadRequest,
    #[error("UNAUTHORIZED")]
    Unauthorized(#[from] AuthError),
    #[error("NOT_FOUND")]
    NotFound,
    #[error("TOO_MANY_REQUESTS")]
    TooManyRequests,
    #[error("SERVICE_UNAVAILABLE")]
    Unavailable(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized(AuthError::Upstream(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::Unauthorized(reason) => serde_json::json!({
                "error": self.to_string(),
                "reason": reason.to_string(),
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}
