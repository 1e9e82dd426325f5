//! Explicandum: a multi-persona reasoning service.
//!
//! A user message fans out to a panel of personas (a logic analyst and a
//! philosophy expert), whose responses stream back over SSE as labeled,
//! contiguous sub-streams. After each exchange the service extracts the
//! user's stances and tracks them as version chains, so contradictions and
//! retractions across a conversation stay visible.

pub mod api;
pub mod config;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod personas;
pub mod retrieval;
pub mod store;
pub mod streamer;
