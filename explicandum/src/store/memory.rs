use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ExplicandumError, Result};
use crate::models::{Conversation, Stance, StanceDelta, StanceOperation, Turn};
use crate::store::traits::{ConversationStore, StanceStore};

/// In-memory conversation store backed by a `RwLock`ed map.
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    inner: RwLock<HashMap<Uuid, Conversation>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn get_or_create(&self, id: Uuid) -> Result<Conversation> {
        let mut conversations = self.inner.write().await;
        let conversation = conversations
            .entry(id)
            .or_insert_with(|| Conversation::new(id));
        Ok(conversation.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Conversation> {
        let conversations = self.inner.read().await;
        conversations
            .get(&id)
            .cloned()
            .ok_or_else(|| ExplicandumError::NotFound(format!("Conversation {id} not found")))
    }

    async fn append_turn(&self, id: Uuid, mut turn: Turn) -> Result<Turn> {
        let mut conversations = self.inner.write().await;
        let conversation = conversations
            .entry(id)
            .or_insert_with(|| Conversation::new(id));

        // Wall clocks can tie or step backwards; nudge the timestamp so
        // ordering within a conversation stays strict.
        if let Some(last) = conversation.turns.last() {
            if turn.timestamp <= last.timestamp {
                turn.timestamp = last.timestamp + Duration::microseconds(1);
            }
        }

        conversation.turns.push(turn.clone());
        Ok(turn)
    }

    async fn recent_turns(&self, id: Uuid, window: usize) -> Result<Vec<Turn>> {
        let conversations = self.inner.read().await;
        Ok(conversations
            .get(&id)
            .map(|conversation| conversation.recent_turns(window).to_vec())
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
struct StanceLog {
    entries: Vec<Stance>,
    /// Topic -> index of the active entry in `entries`.
    active: HashMap<String, usize>,
}

/// In-memory stance store. The whole delta batch for a turn is applied under
/// one write lock, which is what makes supersession atomic for readers.
#[derive(Debug, Default)]
pub struct MemoryStanceStore {
    inner: RwLock<HashMap<Uuid, StanceLog>>,
}

impl MemoryStanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StanceStore for MemoryStanceStore {
    async fn apply_deltas(
        &self,
        conversation_id: Uuid,
        deltas: Vec<StanceDelta>,
    ) -> Result<Vec<Stance>> {
        let mut logs = self.inner.write().await;
        let log = logs.entry(conversation_id).or_default();

        let mut applied = Vec::with_capacity(deltas.len());

        for delta in deltas {
            let mut stance = delta.stance;
            let prior_id = log
                .active
                .get(&stance.topic)
                .map(|&idx| log.entries[idx].id.clone());

            match delta.operation {
                StanceOperation::Add => {
                    if prior_id.is_some() {
                        return Err(ExplicandumError::Validation(format!(
                            "Topic '{}' already has an active stance; use supersede",
                            stance.topic
                        )));
                    }
                }
                StanceOperation::Supersede | StanceOperation::Retract => {
                    let Some(prior_id) = prior_id else {
                        return Err(ExplicandumError::Validation(format!(
                            "No active stance on topic '{}' to replace",
                            stance.topic
                        )));
                    };
                    if stance.supersedes.is_none() {
                        stance.supersedes = Some(prior_id);
                    }
                }
            }

            if delta.operation == StanceOperation::Retract {
                stance.retracted = true;
            }

            let idx = log.entries.len();
            log.entries.push(stance.clone());

            // Retracted entries end the chain: the topic has no active stance.
            if stance.retracted {
                log.active.remove(&stance.topic);
            } else {
                log.active.insert(stance.topic.clone(), idx);
            }

            applied.push(stance);
        }

        Ok(applied)
    }

    async fn active_stances(&self, conversation_id: Uuid) -> Result<Vec<Stance>> {
        let logs = self.inner.read().await;
        let Some(log) = logs.get(&conversation_id) else {
            return Ok(Vec::new());
        };

        let mut stances: Vec<Stance> = log
            .active
            .values()
            .map(|&idx| log.entries[idx].clone())
            .collect();
        stances.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(stances)
    }

    async fn active_for_topic(
        &self,
        conversation_id: Uuid,
        topic: &str,
    ) -> Result<Option<Stance>> {
        let logs = self.inner.read().await;
        Ok(logs.get(&conversation_id).and_then(|log| {
            log.active.get(topic).map(|&idx| log.entries[idx].clone())
        }))
    }

    async fn history(&self, conversation_id: Uuid) -> Result<Vec<Stance>> {
        let logs = self.inner.read().await;
        Ok(logs
            .get(&conversation_id)
            .map(|log| log.entries.clone())
            .unwrap_or_default())
    }
}
