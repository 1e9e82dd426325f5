use async_stream::try_stream;
use futures::StreamExt;

use crate::error::Result;
use crate::llm::{prompts, CompletionOptions, LlmProvider};
use crate::personas::critique::CritiqueScanner;
use crate::personas::{PersonaEvent, PersonaInput, PersonaStream};

/// Shared invocation path for LLM-backed personas: assemble the prompt,
/// stream the completion, then scan the accumulated output for critique
/// signals.
#[derive(Clone)]
pub struct PersonaPipeline {
    persona_id: &'static str,
    framing: &'static str,
    llm: LlmProvider,
}

impl PersonaPipeline {
    pub fn new(persona_id: &'static str, framing: &'static str, llm: LlmProvider) -> Self {
        Self {
            persona_id,
            framing,
            llm,
        }
    }

    pub async fn run(&self, input: PersonaInput) -> Result<PersonaStream> {
        let prompt = prompts::persona_turn_prompt(
            &input.message,
            &input.history,
            &input.stances,
            &input.context,
        );

        let options = CompletionOptions {
            temperature: Some(0.7),
            ..Default::default()
        };

        let persona_id = self.persona_id;
        let deltas = self
            .llm
            .complete_stream(&prompt, Some(self.framing), Some(&options))
            .await?;

        let events = try_stream! {
            let mut deltas = deltas;
            let mut accumulated = String::new();

            while let Some(delta) = deltas.next().await {
                let delta = delta?;
                accumulated.push_str(&delta);
                yield PersonaEvent::Delta(delta);
            }

            tracing::debug!(
                persona_id,
                response_len = accumulated.len(),
                "Persona response complete"
            );

            let signals = CritiqueScanner::new().scan(&accumulated);
            if !signals.is_empty() {
                yield PersonaEvent::Critique(signals);
            }
        };

        Ok(Box::pin(events))
    }
}
