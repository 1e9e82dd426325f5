use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incremental unit of one persona's output. Chunks for a given persona
/// carry strictly increasing sequence numbers, and the merged stream never
/// reorders a single persona's chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChunk {
    pub persona_id: String,
    pub sequence: u64,
    pub delta: String,
    pub is_final: bool,
}

/// Structured note a persona attaches at the end of its sub-stream, e.g.
/// a detected fallacy or contradiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CritiqueSignal {
    /// Signal class, e.g. "contradiction" or "fallacy".
    pub kind: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<String>,
}

/// How a merged stream terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    Ok,
    Error,
}

/// Everything the orchestrator can emit while handling a turn. The response
/// streamer maps these onto transport frames without inspecting content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// First event of every stream. Carries the conversation id so clients
    /// that omitted one learn the id the server minted.
    Started { conversation_id: Uuid },
    Chunk(StreamChunk),
    Critique {
        persona_id: String,
        signals: Vec<CritiqueSignal>,
    },
    /// Terminal error scoped to one persona's sub-stream; other personas
    /// continue.
    PersonaError {
        persona_id: String,
        message: String,
    },
    /// Terminal marker for the whole merged stream.
    Done {
        status: StreamStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}
