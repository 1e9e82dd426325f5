use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Persona,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Persona => write!(f, "persona"),
        }
    }
}

/// One message in a conversation's append-only history. Immutable once
/// appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub role: TurnRole,
    pub persona_id: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Ids of retrieved context items the turn drew on.
    pub references: Vec<String>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: nanoid::nanoid!(),
            role: TurnRole::User,
            persona_id: None,
            text: text.into(),
            timestamp: Utc::now(),
            references: Vec::new(),
        }
    }

    pub fn persona(
        persona_id: impl Into<String>,
        text: impl Into<String>,
        references: Vec<String>,
    ) -> Self {
        Self {
            id: nanoid::nanoid!(),
            role: TurnRole::Persona,
            persona_id: Some(persona_id.into()),
            text: text.into(),
            timestamp: Utc::now(),
            references,
        }
    }
}

/// An append-only sequence of turns, totally ordered by timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            turns: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// The most recent `window` turns, oldest first.
    pub fn recent_turns(&self, window: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(window);
        &self.turns[start..]
    }
}

/// Ranked supporting context returned by the retrieval interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedContext {
    pub text: String,
    pub source_id: String,
    pub score: f64,
}
