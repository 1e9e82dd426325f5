use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-conversation turn lock. A turn's fire-and-forget stance extraction
/// holds the guard until it finishes, so the next turn for the same
/// conversation reads a stance set that already reflects the prior turn.
/// Different conversations never block each other.
#[derive(Debug, Default)]
pub struct TurnSequencer {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl TurnSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the conversation's previous turn (including its extraction)
    /// to finish, then take the lock. The guard is owned so it can be moved
    /// into the extraction task.
    pub async fn acquire(&self, conversation_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // A strong count of 1 means only the map holds the lock: no
            // guard and no waiter. Dropping such entries keeps the map from
            // growing with one entry per conversation ever seen.
            locks.retain(|id, lock| *id == conversation_id || Arc::strong_count(lock) > 1);
            locks
                .entry(conversation_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked_conversations(&self) -> usize {
        self.locks.lock().await.len()
    }
}
