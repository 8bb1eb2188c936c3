use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::MessageStore;
use crate::{error::StoreError, models::chat::StoredMessage};

/// Process-local message store. Messages are kept in insertion order, which is
/// also `created_at` order.
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<Vec<StoredMessage>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(
        &self,
        sender_id: Uuid,
        receiver_id: Option<Uuid>,
        content: &str,
    ) -> Result<StoredMessage, StoreError> {
        let mut messages = self.messages.write().await;
        let message = StoredMessage {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        messages.push(message.clone());
        Ok(message)
    }

    async fn history(
        &self,
        a: Uuid,
        b: Uuid,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.is_between(a, b))
            .take(limit)
            .cloned()
            .collect())
    }
}
