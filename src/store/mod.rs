pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{error::StoreError, models::chat::StoredMessage};

pub use memory::InMemoryMessageStore;

/// Most messages a history query returns.
pub const HISTORY_LIMIT: usize = 100;

/// Durable home of chat messages. The router only appends; history is read by the API.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn append(
        &self,
        sender_id: Uuid,
        receiver_id: Option<Uuid>,
        content: &str,
    ) -> Result<StoredMessage, StoreError>;

    /// Messages exchanged between `a` and `b` in either direction, oldest first.
    async fn history(&self, a: Uuid, b: Uuid, limit: usize)
    -> Result<Vec<StoredMessage>, StoreError>;
}
