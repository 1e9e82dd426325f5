mod conversation;
mod stance;
mod stream;

pub use conversation::{Conversation, RetrievedContext, Turn, TurnRole};
pub use stance::{Polarity, Stance, StanceDelta, StanceOperation};
pub use stream::{CritiqueSignal, StreamChunk, StreamEvent, StreamStatus};
