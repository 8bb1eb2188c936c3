use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chat message as recorded by the message store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    /// Metadata minted locally when the store could not record the message.
    pub fn unsaved(sender_id: Uuid, receiver_id: Option<Uuid>, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content,
            created_at: Utc::now(),
        }
    }

    pub fn is_between(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender_id == a && self.receiver_id == Some(b))
            || (self.sender_id == b && self.receiver_id == Some(a))
    }
}
