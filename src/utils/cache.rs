use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::{error::AuthError, models::auth::Identity};

pub const CACHE_TTL: Duration = Duration::from_secs(30);

pub type AuthVerdict = Result<Identity, AuthError>;

struct CacheEntry {
    verdict: AuthVerdict,
    timestamp: Instant,
}

/// Short-lived memo of remote auth verdicts, keyed by token.
pub struct AuthCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for AuthCache {
    fn default() -> Self {
        Self::new(CACHE_TTL)
    }
}

impl AuthCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn read(&self, token: &str) -> Option<AuthVerdict> {
        let entries = self.entries.read().await;
        entries.get(token).and_then(|entry| {
            if entry.timestamp.elapsed() < self.ttl {
                Some(entry.verdict.clone())
            } else {
                None
            }
        })
    }

    pub async fn write(&self, token: String, verdict: AuthVerdict) {
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.timestamp.elapsed() < ttl);
        entries.insert(
            token,
            CacheEntry {
                verdict,
                timestamp: Instant::now(),
            },
        );
    }
}
