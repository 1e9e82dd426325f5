use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::error::{ExplicandumError, Result};
use crate::extraction::StanceExtractor;
use crate::models::{
    CritiqueSignal, StanceDelta, StreamChunk, StreamEvent, StreamStatus, Turn,
};
use crate::personas::{PersonaAgent, PersonaInput, PersonaEvent, LOGIC_ANALYST_ID};
use crate::retrieval::RetrievalProvider;
use crate::store::{ConversationStore, StanceStore};

pub mod sequencer;

pub use sequencer::TurnSequencer;

/// Merged event stream for one handled turn.
pub type TurnStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

const PERSONA_CHANNEL_CAPACITY: usize = 256;

/// Greeting and pleasantry markers for the small-talk routing heuristic.
const SMALL_TALK_MARKERS: &[&str] = &[
    "hi", "hello", "hey", "thanks", "thank you", "bye", "goodbye", "good morning",
    "good evening", "how are you",
];

enum PersonaMsg {
    Delta(String),
    Critique(Vec<CritiqueSignal>),
    Completed,
    Failed(String),
}

/// Coordinates a turn end to end: persists the user turn, fans the message
/// out to the personas, merges their sub-streams into one labeled stream,
/// persists persona responses, and hands off stance extraction.
pub struct Orchestrator {
    config: OrchestratorConfig,
    conversations: Arc<dyn ConversationStore>,
    stances: Arc<dyn StanceStore>,
    retrieval: Arc<RetrievalProvider>,
    extractor: Arc<StanceExtractor>,
    personas: Vec<Arc<dyn PersonaAgent>>,
    sequencer: TurnSequencer,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        conversations: Arc<dyn ConversationStore>,
        stances: Arc<dyn StanceStore>,
        retrieval: Arc<RetrievalProvider>,
        extractor: Arc<StanceExtractor>,
        personas: Vec<Arc<dyn PersonaAgent>>,
    ) -> Self {
        Self {
            config,
            conversations,
            stances,
            retrieval,
            extractor,
            personas,
            sequencer: TurnSequencer::new(),
        }
    }

    /// Handle one user turn. The returned stream carries all persona
    /// sub-streams (each contiguous, in first-chunk-arrival order) and ends
    /// with a terminal `Done` event. Dropping the stream cancels the
    /// in-flight personas and skips extraction for the turn.
    pub async fn handle_turn(
        &self,
        conversation_id: Uuid,
        message: String,
    ) -> Result<TurnStream> {
        if message.trim().is_empty() {
            return Err(ExplicandumError::Validation(
                "Message cannot be empty".to_string(),
            ));
        }

        // Serialize against the previous turn's extraction so the stance
        // snapshot below is up to date.
        let guard = self.sequencer.acquire(conversation_id).await;

        self.conversations.get_or_create(conversation_id).await?;
        let history = self
            .conversations
            .recent_turns(conversation_id, self.config.history_window)
            .await?;
        let active_stances = self.stances.active_stances(conversation_id).await?;

        let user_turn = self
            .conversations
            .append_turn(conversation_id, Turn::user(message.clone()))
            .await?;

        let context = self.retrieval.retrieve(&message).await;
        let references: Vec<String> = context.iter().map(|c| c.source_id.clone()).collect();

        let selected = self.select_personas(&message);
        tracing::info!(
            %conversation_id,
            turn_id = %user_turn.id,
            persona_count = selected.len(),
            context_count = context.len(),
            "Dispatching turn to personas"
        );

        let input = PersonaInput {
            message,
            history,
            stances: active_stances,
            context,
        };

        let timeout = Duration::from_secs(self.config.persona_timeout_secs);
        let mut pending: Vec<(String, mpsc::Receiver<PersonaMsg>)> = Vec::new();
        for persona in &selected {
            let (tx, rx) = mpsc::channel(PERSONA_CHANNEL_CAPACITY);
            spawn_persona_task(persona.clone(), input.clone(), timeout, tx);
            pending.push((persona.id().to_string(), rx));
        }

        let conversations = self.conversations.clone();
        let stances = self.stances.clone();
        let extractor = self.extractor.clone();

        let events = async_stream::stream! {
            // Moved in so a dropped stream releases the turn lock and the
            // extraction below never runs for abandoned turns.
            let guard = guard;

            let mut pending = pending;
            let mut any_success = false;

            yield StreamEvent::Started { conversation_id };

            while !pending.is_empty() {
                // First arrival wins the next sub-stream slot.
                let (first, idx) = {
                    let recv_futures = pending
                        .iter_mut()
                        .map(|(_, rx)| Box::pin(rx.recv()))
                        .collect::<Vec<_>>();
                    let (msg, idx, rest) = futures::future::select_all(recv_futures).await;
                    drop(rest);
                    (msg, idx)
                };
                let (persona_id, mut rx) = pending.swap_remove(idx);

                // Drain this persona fully before moving on, which is what
                // keeps each sub-stream contiguous.
                let mut sequence: u64 = 0;
                let mut text = String::new();
                let mut critiques: Vec<CritiqueSignal> = Vec::new();
                let mut failure: Option<String> = None;
                let mut next = first;

                loop {
                    match next {
                        Some(PersonaMsg::Delta(delta)) => {
                            text.push_str(&delta);
                            yield StreamEvent::Chunk(StreamChunk {
                                persona_id: persona_id.clone(),
                                sequence,
                                delta,
                                is_final: false,
                            });
                            sequence += 1;
                        }
                        Some(PersonaMsg::Critique(signals)) => {
                            critiques = signals;
                        }
                        Some(PersonaMsg::Failed(message)) => {
                            failure = Some(message);
                            break;
                        }
                        Some(PersonaMsg::Completed) | None => break,
                    }
                    next = rx.recv().await;
                }

                if let Some(message) = failure {
                    tracing::warn!(persona_id, error = %message, "Persona failed");
                    yield StreamEvent::PersonaError {
                        persona_id,
                        message,
                    };
                    continue;
                }

                yield StreamEvent::Chunk(StreamChunk {
                    persona_id: persona_id.clone(),
                    sequence,
                    delta: String::new(),
                    is_final: true,
                });

                if !critiques.is_empty() {
                    for signal in &mut critiques {
                        signal.turn_id = Some(user_turn.id.clone());
                    }
                    yield StreamEvent::Critique {
                        persona_id: persona_id.clone(),
                        signals: critiques,
                    };
                }

                if !text.is_empty() {
                    let persona_turn =
                        Turn::persona(persona_id.clone(), text, references.clone());
                    if let Err(error) = conversations
                        .append_turn(conversation_id, persona_turn)
                        .await
                    {
                        tracing::error!(persona_id, error = %error, "Failed to persist persona turn");
                    }
                }

                any_success = true;
            }

            if any_success {
                yield StreamEvent::Done {
                    status: StreamStatus::Ok,
                    message: None,
                };
            } else {
                yield StreamEvent::Done {
                    status: StreamStatus::Error,
                    message: Some("All personas failed".to_string()),
                };
            }

            // Extraction runs after the stream completes, holding the turn
            // lock so the next turn waits for its result.
            let user_turn = user_turn;
            tokio::spawn(async move {
                let _guard = guard;

                let active = match stances.active_stances(conversation_id).await {
                    Ok(active) => active,
                    Err(error) => {
                        tracing::warn!(%conversation_id, error = %error, "Skipping extraction, stance read failed");
                        return;
                    }
                };

                let deltas = extractor.extract(&user_turn, &active).await;
                if deltas.is_empty() {
                    return;
                }

                if let Err(error) = stances.apply_deltas(conversation_id, deltas).await {
                    tracing::warn!(%conversation_id, error = %error, "Failed to apply stance deltas");
                }
            });
        };

        Ok(Box::pin(events))
    }

    /// Extract and apply stance deltas for a message synchronously, without
    /// running the personas. The message is persisted as a user turn so the
    /// resulting stances trace back to it.
    pub async fn extract_stances(
        &self,
        conversation_id: Uuid,
        message: &str,
    ) -> Result<Vec<StanceDelta>> {
        if message.trim().is_empty() {
            return Err(ExplicandumError::Validation(
                "Message cannot be empty".to_string(),
            ));
        }

        let _guard = self.sequencer.acquire(conversation_id).await;

        self.conversations.get_or_create(conversation_id).await?;
        let user_turn = self
            .conversations
            .append_turn(conversation_id, Turn::user(message))
            .await?;

        let active = self.stances.active_stances(conversation_id).await?;
        let deltas = self.extractor.extract(&user_turn, &active).await;

        if !deltas.is_empty() {
            self.stances
                .apply_deltas(conversation_id, deltas.clone())
                .await?;
        }

        Ok(deltas)
    }

    fn select_personas(&self, message: &str) -> Vec<Arc<dyn PersonaAgent>> {
        if self.config.skip_small_talk
            && is_small_talk(message, self.config.small_talk_max_words)
            && self.personas.len() > 1
        {
            let selected: Vec<_> = self
                .personas
                .iter()
                .filter(|persona| persona.id() != LOGIC_ANALYST_ID)
                .cloned()
                .collect();
            if !selected.is_empty() {
                tracing::debug!("Small-talk turn, skipping logic analyst");
                return selected;
            }
        }

        self.personas.clone()
    }
}

fn spawn_persona_task(
    persona: Arc<dyn PersonaAgent>,
    input: PersonaInput,
    timeout: Duration,
    tx: mpsc::Sender<PersonaMsg>,
) {
    tokio::spawn(async move {
        let outcome = tokio::time::timeout(timeout, async {
            let mut stream = persona.analyze(input).await?;

            while let Some(event) = stream.next().await {
                let msg = match event? {
                    PersonaEvent::Delta(delta) => PersonaMsg::Delta(delta),
                    PersonaEvent::Critique(signals) => PersonaMsg::Critique(signals),
                };

                // A closed channel means the consumer went away.
                if tx.send(msg).await.is_err() {
                    return Ok(true);
                }
            }

            Ok::<bool, ExplicandumError>(false)
        })
        .await;

        let terminal = match outcome {
            Ok(Ok(true)) => return,
            Ok(Ok(false)) => PersonaMsg::Completed,
            Ok(Err(error)) => PersonaMsg::Failed(error.to_string()),
            Err(_) => PersonaMsg::Failed(format!(
                "Timed out after {} seconds",
                timeout.as_secs()
            )),
        };

        let _ = tx.send(terminal).await;
    });
}

fn is_small_talk(message: &str, max_words: usize) -> bool {
    // Markers must match whole words, never substrings ("hi" is not a
    // marker inside "philosophy").
    let words: Vec<String> = message
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect();

    if words.is_empty() || words.len() > max_words {
        return false;
    }

    let normalized = format!(" {} ", words.join(" "));
    SMALL_TALK_MARKERS
        .iter()
        .any(|marker| normalized.contains(&format!(" {marker} ")))
}
