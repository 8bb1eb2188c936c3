use std::{sync::Arc, time::Duration};

use crate::{
    auth::{AccountDirectory, Authenticator},
    store::MessageStore,
    utils::rate_limit::RateLimiter,
    websocket::{ConnectionLimits, Hub},
};

const DEFAULT_RATE_LIMIT_COUNT: u32 = 100;
const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

pub struct AppState {
    pub hub: Hub,
    pub authenticator: Arc<dyn Authenticator>,
    pub accounts: Arc<dyn AccountDirectory>,
    pub store: Arc<dyn MessageStore>,
    pub rate_limiter: RateLimiter,
    pub admin_token: String,
    pub limits: ConnectionLimits,
}

impl AppState {
    pub fn new(
        hub: Hub,
        authenticator: Arc<dyn Authenticator>,
        accounts: Arc<dyn AccountDirectory>,
        store: Arc<dyn MessageStore>,
        admin_token: String,
    ) -> Self {
        Self {
            hub,
            authenticator,
            accounts,
            store,
            rate_limiter: RateLimiter::new(DEFAULT_RATE_LIMIT_COUNT, DEFAULT_RATE_LIMIT_WINDOW),
            admin_token,
            limits: ConnectionLimits::default(),
        }
    }

    pub fn with_rate_limit(mut self, count: u32, window: Duration) -> Self {
        self.rate_limiter = RateLimiter::new(count, window);
        self
    }

    pub fn with_limits(mut self, limits: ConnectionLimits) -> Self {
        self.limits = limits;
        self
    }
}
