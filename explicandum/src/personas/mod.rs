use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;
use crate::models::{CritiqueSignal, RetrievedContext, Stance, Turn};

pub mod critique;
pub mod logic;
pub mod philosophy;
pub mod pipeline;

pub use critique::CritiqueScanner;
pub use logic::LogicAnalyst;
pub use philosophy::PhilosophyExpert;
pub use pipeline::PersonaPipeline;

pub const LOGIC_ANALYST_ID: &str = "logic_analyst";
pub const PHILOSOPHY_EXPERT_ID: &str = "philosophy_expert";

/// Everything a persona sees for one invocation.
#[derive(Debug, Clone)]
pub struct PersonaInput {
    pub message: String,
    pub history: Vec<Turn>,
    pub stances: Vec<Stance>,
    pub context: Vec<RetrievedContext>,
}

/// What a persona emits while analyzing a turn.
#[derive(Debug, Clone)]
pub enum PersonaEvent {
    /// Incremental response text.
    Delta(String),
    /// Structured critique signals, emitted once after the text completes.
    Critique(Vec<CritiqueSignal>),
}

pub type PersonaStream = Pin<Box<dyn Stream<Item = Result<PersonaEvent>> + Send>>;

/// A reasoning persona. Implementations produce a stream of text deltas,
/// optionally followed by critique signals.
#[async_trait]
pub trait PersonaAgent: Send + Sync {
    /// Stable identifier used to label sub-streams, e.g. "logic_analyst".
    fn id(&self) -> &str;

    /// Human-readable name for documentation surfaces.
    fn display_name(&self) -> &str;

    /// Analyze the user's message and stream the persona's response.
    async fn analyze(&self, input: PersonaInput) -> Result<PersonaStream>;
}
