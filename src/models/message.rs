use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{chat::StoredMessage, client::OnlineUser};

/// Format used for `created_at` on the wire.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Chat,
    Typing,
    TypingStop,
    OnlineUsers,
    #[serde(other)]
    Unknown,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Typing => "typing",
            Self::TypingStop => "typing_stop",
            Self::OnlineUsers => "online_users",
            Self::Unknown => "unknown",
        }
    }
}

/// A frame as sent by a peer. Any `sender_id` the peer includes is ignored.
#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub receiver_id: Option<Uuid>,
    #[serde(default)]
    pub content: String,
}

/// The unit handed to the hub's dispatch loop.
///
/// `payload` is serialized once by the producer and shared by every target.
/// An envelope without a sender originates from the hub itself.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub kind: MessageKind,
    pub sender_id: Option<Uuid>,
    pub receiver_id: Option<Uuid>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Arc<str>,
}

impl Envelope {
    pub fn chat(message: &StoredMessage, username: &str) -> Self {
        let payload = ChatPayload {
            kind: MessageKind::Chat,
            id: message.id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: &message.content,
            created_at: message.created_at.format(TIMESTAMP_FORMAT).to_string(),
            sender: SenderInfo {
                id: message.sender_id,
                username,
            },
        };

        Self {
            kind: MessageKind::Chat,
            sender_id: Some(message.sender_id),
            receiver_id: message.receiver_id,
            content: message.content.clone(),
            timestamp: message.created_at,
            payload: to_payload(&payload),
        }
    }

    pub fn typing(
        kind: MessageKind,
        sender_id: Uuid,
        receiver_id: Uuid,
        username: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let payload = TypingPayload {
            kind,
            sender_id,
            receiver_id,
            username,
        };

        Self {
            kind,
            sender_id: Some(sender_id),
            receiver_id: Some(receiver_id),
            content: String::new(),
            timestamp,
            payload: to_payload(&payload),
        }
    }

    pub fn online_users(users: &[OnlineUser]) -> Self {
        let payload = OnlineUsersPayload {
            kind: MessageKind::OnlineUsers,
            users,
        };

        Self {
            kind: MessageKind::OnlineUsers,
            sender_id: None,
            receiver_id: None,
            content: String::new(),
            timestamp: Utc::now(),
            payload: to_payload(&payload),
        }
    }
}

/// An empty payload marks an envelope the hub will not fan out.
fn to_payload<T: Serialize>(value: &T) -> Arc<str> {
    match serde_json::to_string(value) {
        Ok(json) => Arc::from(json),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize outbound payload");
            Arc::from("")
        }
    }
}

#[derive(Serialize)]
struct SenderInfo<'a> {
    id: Uuid,
    username: &'a str,
}

#[derive(Serialize)]
struct ChatPayload<'a> {
    #[serde(rename = "type")]
    kind: MessageKind,
    id: Uuid,
    sender_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    receiver_id: Option<Uuid>,
    content: &'a str,
    created_at: String,
    sender: SenderInfo<'a>,
}

#[derive(Serialize)]
struct TypingPayload<'a> {
    #[serde(rename = "type")]
    kind: MessageKind,
    sender_id: Uuid,
    receiver_id: Uuid,
    username: &'a str,
}

#[derive(Serialize)]
struct OnlineUsersPayload<'a> {
    #[serde(rename = "type")]
    kind: MessageKind,
    users: &'a [OnlineUser],
}
