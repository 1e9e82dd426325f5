pub mod memory;
pub mod traits;

pub use memory::{MemoryConversationStore, MemoryStanceStore};
pub use traits::{ConversationStore, StanceStore};
