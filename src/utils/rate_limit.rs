use std::{
    collections::HashMap,
    net::IpAddr,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::error::ApiError;

#[derive(Clone)]
struct RateLimitEntry {
    count: u32,
    last_reset: Instant,
}

/// Fixed-window limiter for websocket upgrades, keyed by peer IP.
pub struct RateLimiter {
    entries: Mutex<HashMap<IpAddr, RateLimitEntry>>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            limit,
            window,
        }
    }

    pub async fn check(&self, ip: IpAddr) -> Result<(), ApiError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = self.window;
        entries.retain(|_, entry| now.duration_since(entry.last_reset) <= window);

        let entry = entries.entry(ip).or_insert(RateLimitEntry {
            count: 0,
            last_reset: now,
        });

        if now.duration_since(entry.last_reset) > self.window {
            entry.count = 0;
            entry.last_reset = now;
        }

        if entry.count >= self.limit {
            tracing::warn!(%ip, "websocket upgrade rate limited");
            return Err(ApiError::TooManyRequests);
        }

        entry.count += 1;
        Ok(())
    }
}
