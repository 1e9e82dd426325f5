use async_trait::async_trait;

use crate::error::Result;
use crate::llm::{prompts, LlmProvider};
use crate::personas::pipeline::PersonaPipeline;
use crate::personas::{PersonaAgent, PersonaInput, PersonaStream, PHILOSOPHY_EXPERT_ID};

/// Persona that situates the user's message in the relevant philosophical
/// tradition and engages its strongest form.
pub struct PhilosophyExpert {
    pipeline: PersonaPipeline,
}

impl PhilosophyExpert {
    pub fn new(llm: LlmProvider) -> Self {
        Self {
            pipeline: PersonaPipeline::new(
                PHILOSOPHY_EXPERT_ID,
                prompts::PHILOSOPHY_EXPERT_FRAMING,
                llm,
            ),
        }
    }
}

#[async_trait]
impl PersonaAgent for PhilosophyExpert {
    fn id(&self) -> &str {
        PHILOSOPHY_EXPERT_ID
    }

    fn display_name(&self) -> &str {
        "Philosophy Expert"
    }

    async fn analyze(&self, input: PersonaInput) -> Result<PersonaStream> {
        self.pipeline.run(input).await
    }
}
