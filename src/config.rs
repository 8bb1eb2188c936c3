use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::websocket::{ConnectionLimits, hub::HUB_QUEUE_CAPACITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthMode {
    /// Verify HS256 tokens with the shared secret.
    Jwt,
    /// Ask the dashboard API to vouch for each token.
    Remote,
}

/// Real-time chat relay for the admin dashboard
#[derive(Parser, Debug, Clone)]
#[command(name = "dashboard-relay", version, about)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "RELAY_PORT", default_value_t = 4010)]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "RELAY_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// How websocket and API bearer tokens are checked
    #[arg(long, env = "RELAY_AUTH_MODE", value_enum, default_value_t = AuthMode::Jwt)]
    pub auth_mode: AuthMode,

    /// HS256 secret shared with the dashboard API (jwt mode)
    #[arg(long, env = "RELAY_JWT_SECRET", required_if_eq("auth_mode", "jwt"))]
    pub jwt_secret: Option<String>,

    /// Token verification endpoint (remote mode)
    #[arg(long, env = "RELAY_AUTH_ENDPOINT", required_if_eq("auth_mode", "remote"))]
    pub auth_endpoint: Option<String>,

    /// Token expected in the Authorization header of /admin routes
    #[arg(long, env = "RELAY_ADMIN_TOKEN")]
    pub admin_token: String,

    /// Websocket upgrades allowed per IP per window
    #[arg(long, env = "RELAY_RATE_LIMIT_COUNT", default_value_t = 100)]
    pub rate_limit_count: u32,

    /// Rate limit window in seconds
    #[arg(long, env = "RELAY_RATE_LIMIT_SECONDS", default_value_t = 60)]
    pub rate_limit_seconds: u64,

    /// Submissions the hub buffers before senders wait
    #[arg(long, env = "RELAY_HUB_CAPACITY", default_value_t = HUB_QUEUE_CAPACITY)]
    pub hub_capacity: usize,

    /// Outbound payloads buffered per connection before it is evicted
    #[arg(long, env = "RELAY_SEND_QUEUE_CAPACITY", default_value_t = 256)]
    pub send_queue_capacity: usize,

    /// Emit JSON logs instead of human-readable ones
    #[arg(long, env = "RELAY_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_seconds)
    }

    pub fn connection_limits(&self) -> ConnectionLimits {
        ConnectionLimits {
            send_queue_capacity: self.send_queue_capacity,
            ..ConnectionLimits::default()
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
