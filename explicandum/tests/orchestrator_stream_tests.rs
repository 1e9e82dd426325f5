use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use uuid::Uuid;

use explicandum::config::{ExtractionConfig, OrchestratorConfig};
use explicandum::error::{ExplicandumError, Result};
use explicandum::extraction::StanceExtractor;
use explicandum::llm::LlmProvider;
use explicandum::models::{CritiqueSignal, StreamEvent, StreamStatus};
use explicandum::orchestrator::Orchestrator;
use explicandum::personas::{PersonaAgent, PersonaEvent, PersonaInput, PersonaStream};
use explicandum::retrieval::RetrievalProvider;
use explicandum::store::{
    ConversationStore, MemoryConversationStore, MemoryStanceStore, StanceStore,
};

/// Persona that emits a fixed script of deltas with a pause between each,
/// then optionally a critique.
struct ScriptedPersona {
    id: &'static str,
    deltas: Vec<&'static str>,
    delay: Duration,
    initial_delay: Duration,
    critique: Vec<CritiqueSignal>,
}

impl ScriptedPersona {
    fn new(id: &'static str, deltas: Vec<&'static str>) -> Self {
        Self {
            id,
            deltas,
            delay: Duration::from_millis(5),
            initial_delay: Duration::ZERO,
            critique: Vec::new(),
        }
    }

    fn starting_after(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    fn with_critique(mut self, critique: Vec<CritiqueSignal>) -> Self {
        self.critique = critique;
        self
    }
}

#[async_trait]
impl PersonaAgent for ScriptedPersona {
    fn id(&self) -> &str {
        self.id
    }

    fn display_name(&self) -> &str {
        self.id
    }

    async fn analyze(&self, _input: PersonaInput) -> Result<PersonaStream> {
        let deltas = self.deltas.clone();
        let delay = self.delay;
        let initial_delay = self.initial_delay;
        let critique = self.critique.clone();

        Ok(Box::pin(async_stream::stream! {
            tokio::time::sleep(initial_delay).await;
            for delta in deltas {
                yield Ok(PersonaEvent::Delta(delta.to_string()));
                tokio::time::sleep(delay).await;
            }
            if !critique.is_empty() {
                yield Ok(PersonaEvent::Critique(critique));
            }
        }))
    }
}

/// Persona whose analyze call fails outright.
struct BrokenPersona {
    id: &'static str,
}

#[async_trait]
impl PersonaAgent for BrokenPersona {
    fn id(&self) -> &str {
        self.id
    }

    fn display_name(&self) -> &str {
        self.id
    }

    async fn analyze(&self, _input: PersonaInput) -> Result<PersonaStream> {
        Err(ExplicandumError::Llm("backend exploded".to_string()))
    }
}

/// Persona that hangs past any reasonable timeout.
struct StalledPersona {
    id: &'static str,
}

#[async_trait]
impl PersonaAgent for StalledPersona {
    fn id(&self) -> &str {
        self.id
    }

    fn display_name(&self) -> &str {
        self.id
    }

    async fn analyze(&self, _input: PersonaInput) -> Result<PersonaStream> {
        Ok(Box::pin(async_stream::stream! {
            yield Ok(PersonaEvent::Delta("thinking".to_string()));
            tokio::time::sleep(Duration::from_secs(3600)).await;
            yield Ok(PersonaEvent::Delta("never emitted".to_string()));
        }))
    }
}

struct Harness {
    orchestrator: Orchestrator,
    conversations: Arc<MemoryConversationStore>,
    stances: Arc<MemoryStanceStore>,
}

fn harness(personas: Vec<Arc<dyn PersonaAgent>>, config: OrchestratorConfig) -> Harness {
    let conversations = Arc::new(MemoryConversationStore::new());
    let stances = Arc::new(MemoryStanceStore::new());

    let extractor = Arc::new(StanceExtractor::new(
        LlmProvider::unavailable("not configured in tests"),
        ExtractionConfig::default(),
    ));

    let orchestrator = Orchestrator::new(
        config,
        conversations.clone() as Arc<dyn ConversationStore>,
        stances.clone() as Arc<dyn StanceStore>,
        Arc::new(RetrievalProvider::unavailable()),
        extractor,
        personas,
    );

    Harness {
        orchestrator,
        conversations,
        stances,
    }
}

async fn collect(
    harness: &Harness,
    conversation_id: Uuid,
    message: &str,
) -> Vec<StreamEvent> {
    let stream = harness
        .orchestrator
        .handle_turn(conversation_id, message.to_string())
        .await
        .unwrap();
    stream.collect().await
}

fn chunk_personas(events: &[StreamEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::Chunk(chunk) => Some(chunk.persona_id.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn sub_streams_are_contiguous_and_sequenced() {
    let harness = harness(
        vec![
            Arc::new(ScriptedPersona::new(
                "alpha",
                vec!["All ravens ", "are black. ", "Therefore..."],
            )),
            Arc::new(ScriptedPersona::new(
                "beta",
                vec!["Hempel's paradox ", "suggests otherwise."],
            )),
        ],
        OrchestratorConfig::default(),
    );

    let conversation_id = Uuid::new_v4();
    let events = collect(&harness, conversation_id, "Are all ravens black?").await;

    // The stream opens by announcing which conversation it belongs to.
    assert!(matches!(
        events.first(),
        Some(StreamEvent::Started { conversation_id: id }) if *id == conversation_id
    ));

    // Each persona's chunks, finals included, form one contiguous run.
    let order = chunk_personas(&events);
    let mut runs: Vec<String> = Vec::new();
    for persona in &order {
        if runs.last() != Some(persona) {
            runs.push(persona.clone());
        }
    }
    assert_eq!(runs.len(), 2, "sub-streams interleaved: {order:?}");

    // Per-persona sequence numbers start at 0 and increase by one, with a
    // final empty marker chunk.
    let mut by_persona: HashMap<String, Vec<(u64, String, bool)>> = HashMap::new();
    for event in &events {
        if let StreamEvent::Chunk(chunk) = event {
            by_persona.entry(chunk.persona_id.clone()).or_default().push((
                chunk.sequence,
                chunk.delta.clone(),
                chunk.is_final,
            ));
        }
    }

    for (persona_id, chunks) in &by_persona {
        for (expected, (sequence, _, _)) in chunks.iter().enumerate() {
            assert_eq!(*sequence, expected as u64, "gap in {persona_id} sequence");
        }
        let (_, delta, is_final) = chunks.last().unwrap();
        assert!(*is_final, "{persona_id} missing final chunk");
        assert!(delta.is_empty(), "{persona_id} final chunk should be empty");
        assert!(
            chunks[..chunks.len() - 1].iter().all(|(_, _, f)| !f),
            "{persona_id} emitted is_final mid-stream"
        );
    }

    let alpha: String = by_persona["alpha"].iter().map(|(_, d, _)| d.as_str()).collect();
    assert_eq!(alpha, "All ravens are black. Therefore...");

    assert!(matches!(
        events.last(),
        Some(StreamEvent::Done {
            status: StreamStatus::Ok,
            ..
        })
    ));
}

#[tokio::test]
async fn first_chunk_arrival_decides_sub_stream_order() {
    let harness = harness(
        vec![
            Arc::new(
                ScriptedPersona::new("slow", vec!["slow response"])
                    .starting_after(Duration::from_millis(200)),
            ),
            Arc::new(ScriptedPersona::new("fast", vec!["fast ", "response"])),
        ],
        OrchestratorConfig::default(),
    );

    let events = collect(&harness, Uuid::new_v4(), "Which arrives first?").await;

    let order = chunk_personas(&events);
    assert_eq!(order.first().map(String::as_str), Some("fast"));
    assert_eq!(order.last().map(String::as_str), Some("slow"));
}

#[tokio::test]
async fn failed_persona_is_isolated_from_the_rest() {
    let harness = harness(
        vec![
            Arc::new(BrokenPersona { id: "broken" }),
            Arc::new(ScriptedPersona::new("healthy", vec!["still here"])),
        ],
        OrchestratorConfig::default(),
    );

    let events = collect(&harness, Uuid::new_v4(), "Does one failure poison the turn?").await;

    assert!(events.iter().any(|event| matches!(
        event,
        StreamEvent::PersonaError { persona_id, message }
            if persona_id == "broken" && message.contains("backend exploded")
    )));

    let order = chunk_personas(&events);
    assert!(order.iter().all(|p| p == "healthy"));

    assert!(matches!(
        events.last(),
        Some(StreamEvent::Done {
            status: StreamStatus::Ok,
            ..
        })
    ));
}

#[tokio::test]
async fn all_personas_failing_ends_with_error_but_keeps_user_turn() {
    let harness = harness(
        vec![
            Arc::new(BrokenPersona { id: "broken_one" }),
            Arc::new(BrokenPersona { id: "broken_two" }),
        ],
        OrchestratorConfig::default(),
    );

    let conversation_id = Uuid::new_v4();
    let events = collect(&harness, conversation_id, "Anyone home?").await;

    assert!(matches!(
        events.last(),
        Some(StreamEvent::Done {
            status: StreamStatus::Error,
            message: Some(message),
        }) if message == "All personas failed"
    ));

    // The user's message is part of history even though no persona answered.
    let conversation = harness.conversations.get(conversation_id).await.unwrap();
    assert_eq!(conversation.turns.len(), 1);
    assert_eq!(conversation.turns[0].text, "Anyone home?");
}

#[tokio::test]
async fn stalled_persona_times_out_without_blocking_others() {
    let config = OrchestratorConfig {
        persona_timeout_secs: 1,
        ..OrchestratorConfig::default()
    };
    let harness = harness(
        vec![
            Arc::new(StalledPersona { id: "stalled" }),
            Arc::new(ScriptedPersona::new("prompt", vec!["quick answer"])),
        ],
        config,
    );

    let events = collect(&harness, Uuid::new_v4(), "Will you hang forever?").await;

    assert!(events.iter().any(|event| matches!(
        event,
        StreamEvent::PersonaError { persona_id, message }
            if persona_id == "stalled" && message.contains("Timed out after 1 seconds")
    )));
    assert!(matches!(
        events.last(),
        Some(StreamEvent::Done {
            status: StreamStatus::Ok,
            ..
        })
    ));
}

#[tokio::test]
async fn critique_signals_reference_the_user_turn() {
    let harness = harness(
        vec![Arc::new(
            ScriptedPersona::new("critic", vec!["Your premise is circular."]).with_critique(vec![
                CritiqueSignal {
                    kind: "fallacy".to_string(),
                    detail: "begging the question".to_string(),
                    turn_id: None,
                },
            ]),
        )],
        OrchestratorConfig::default(),
    );

    let conversation_id = Uuid::new_v4();
    let events = collect(&harness, conversation_id, "Truth is what is true.").await;

    let conversation = harness.conversations.get(conversation_id).await.unwrap();
    let user_turn_id = conversation.turns[0].id.clone();

    let signals = events
        .iter()
        .find_map(|event| match event {
            StreamEvent::Critique { signals, .. } => Some(signals.clone()),
            _ => None,
        })
        .expect("critique event missing");

    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].kind, "fallacy");
    assert_eq!(signals[0].turn_id.as_deref(), Some(user_turn_id.as_str()));
}

#[tokio::test]
async fn persona_responses_are_persisted_as_turns() {
    let harness = harness(
        vec![Arc::new(ScriptedPersona::new(
            "scribe",
            vec!["part one, ", "part two"],
        ))],
        OrchestratorConfig::default(),
    );

    let conversation_id = Uuid::new_v4();
    let events = collect(&harness, conversation_id, "Write something down.").await;
    assert!(matches!(
        events.last(),
        Some(StreamEvent::Done {
            status: StreamStatus::Ok,
            ..
        })
    ));

    let conversation = harness.conversations.get(conversation_id).await.unwrap();
    assert_eq!(conversation.turns.len(), 2);
    let persona_turn = &conversation.turns[1];
    assert_eq!(persona_turn.persona_id.as_deref(), Some("scribe"));
    assert_eq!(persona_turn.text, "part one, part two");
}

#[tokio::test]
async fn dropped_stream_releases_the_turn_lock() {
    let harness = harness(
        vec![Arc::new(ScriptedPersona::new(
            "alpha",
            vec!["first ", "second ", "third"],
        ))],
        OrchestratorConfig::default(),
    );

    let conversation_id = Uuid::new_v4();
    let mut stream = harness
        .orchestrator
        .handle_turn(conversation_id, "Initial question".to_string())
        .await
        .unwrap();

    // Take one event, then abandon the stream mid-turn.
    let first = stream.next().await;
    assert!(first.is_some());
    drop(stream);

    // The next turn must not deadlock on the abandoned one.
    let events = tokio::time::timeout(
        Duration::from_secs(5),
        collect(&harness, conversation_id, "Follow-up question"),
    )
    .await
    .expect("abandoned turn kept the conversation locked");

    assert!(matches!(
        events.last(),
        Some(StreamEvent::Done {
            status: StreamStatus::Ok,
            ..
        })
    ));

    // No extraction ran, so no stances appeared for either turn.
    assert!(harness
        .stances
        .active_stances(conversation_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn small_talk_skips_the_logic_analyst() {
    let config = OrchestratorConfig {
        skip_small_talk: true,
        ..OrchestratorConfig::default()
    };
    let harness = harness(
        vec![
            Arc::new(ScriptedPersona::new("logic_analyst", vec!["formal analysis"])),
            Arc::new(ScriptedPersona::new(
                "philosophy_expert",
                vec!["warm reply"],
            )),
        ],
        config,
    );

    let events = collect(&harness, Uuid::new_v4(), "hi there").await;
    let order = chunk_personas(&events);
    assert!(!order.is_empty());
    assert!(order.iter().all(|p| p == "philosophy_expert"));

    // Substantive questions still go to the full panel.
    let events = collect(
        &harness,
        Uuid::new_v4(),
        "Is moral realism defensible against the argument from disagreement?",
    )
    .await;
    let order = chunk_personas(&events);
    assert!(order.iter().any(|p| p == "logic_analyst"));
    assert!(order.iter().any(|p| p == "philosophy_expert"));
}
