use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Conversation, Stance, StanceDelta, Turn};

/// Storage backend for conversation histories. Turns are append-only;
/// implementations must keep timestamps strictly increasing within a
/// conversation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Fetch a conversation, creating an empty one if the id is new.
    async fn get_or_create(&self, id: Uuid) -> Result<Conversation>;

    /// Fetch an existing conversation.
    async fn get(&self, id: Uuid) -> Result<Conversation>;

    /// Append a turn and return it as stored (the timestamp may have been
    /// adjusted to preserve ordering).
    async fn append_turn(&self, id: Uuid, turn: Turn) -> Result<Turn>;

    /// The most recent `window` turns, oldest first.
    async fn recent_turns(&self, id: Uuid, window: usize) -> Result<Vec<Turn>>;
}

/// Storage backend for stance version chains. At most one stance per topic
/// is active in a conversation at any time; superseded and retracted entries
/// remain readable as history.
#[async_trait]
pub trait StanceStore: Send + Sync {
    /// Apply a batch of deltas atomically. Supersession of the prior active
    /// stance and activation of the new one happen under one lock, so no
    /// reader observes zero or two active stances for a topic mid-update.
    async fn apply_deltas(
        &self,
        conversation_id: Uuid,
        deltas: Vec<StanceDelta>,
    ) -> Result<Vec<Stance>>;

    /// All currently active stances, most recently created first.
    async fn active_stances(&self, conversation_id: Uuid) -> Result<Vec<Stance>>;

    /// The currently active stance for a topic, if any.
    async fn active_for_topic(
        &self,
        conversation_id: Uuid,
        topic: &str,
    ) -> Result<Option<Stance>>;

    /// The full stance log including superseded and retracted entries, in
    /// insertion order.
    async fn history(&self, conversation_id: Uuid) -> Result<Vec<Stance>>;
}
