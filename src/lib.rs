pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod state;
pub mod store;
pub mod utils;
pub mod websocket;

pub use api::types::{ApiResponse, ApiResult, IntoApiResponse, api_response};
pub use server::Server;
pub use state::AppState;
