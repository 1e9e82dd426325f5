pub mod api;
pub mod prompts;
pub mod provider;

pub use provider::{CompletionOptions, CompletionStream, LlmBackend, LlmProvider};
