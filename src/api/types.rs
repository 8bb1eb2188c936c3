use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Envelope for JSON API bodies: `{"data": …, "error": null}` or
/// `{"data": null, "error": "…"}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Success { data: T, error: Option<()> },
    Error { data: Option<()>, error: String },
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::Success { data, error: None }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            data: None,
            error: error.into(),
        }
    }
}

pub trait IntoApiResponse<T> {
    fn into_api_response(self) -> ApiResponse<T>;
}

impl<T, E: ToString> IntoApiResponse<T> for Result<T, E> {
    fn into_api_response(self) -> ApiResponse<T> {
        match self {
            Ok(data) => ApiResponse::success(data),
            Err(error) => ApiResponse::error(error.to_string()),
        }
    }
}

pub struct ApiResult<T>(pub ApiResponse<T>);

impl<T: Serialize> IntoResponse for ApiResult<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

pub fn api_response<T>(response: impl IntoApiResponse<T>) -> ApiResult<T> {
    ApiResult(response.into_api_response())
}
