use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AuthError;

/// Answers whether a user may still connect. Consulted after a token's
/// signature and expiry have been accepted.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn is_active(&self, user_id: Uuid) -> Result<bool, AuthError>;

    async fn set_active(&self, user_id: Uuid, active: bool);
}

/// Accounts are active unless deactivated through the admin API.
#[derive(Default)]
pub struct InMemoryAccountDirectory {
    deactivated: RwLock<HashSet<Uuid>>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn is_active(&self, user_id: Uuid) -> Result<bool, AuthError> {
        Ok(!self.deactivated.read().await.contains(&user_id))
    }

    async fn set_active(&self, user_id: Uuid, active: bool) {
        let mut deactivated = self.deactivated.write().await;
        if active {
            deactivated.remove(&user_id);
        } else {
            deactivated.insert(user_id);
        }
    }
}
