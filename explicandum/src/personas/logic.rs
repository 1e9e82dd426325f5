use async_trait::async_trait;

use crate::error::Result;
use crate::llm::{prompts, LlmProvider};
use crate::personas::pipeline::PersonaPipeline;
use crate::personas::{PersonaAgent, PersonaInput, PersonaStream, LOGIC_ANALYST_ID};

/// Persona that dissects argument structure, names fallacies, and flags
/// contradictions with the user's tracked stances.
pub struct LogicAnalyst {
    pipeline: PersonaPipeline,
}

impl LogicAnalyst {
    pub fn new(llm: LlmProvider) -> Self {
        Self {
            pipeline: PersonaPipeline::new(LOGIC_ANALYST_ID, prompts::LOGIC_ANALYST_FRAMING, llm),
        }
    }
}

#[async_trait]
impl PersonaAgent for LogicAnalyst {
    fn id(&self) -> &str {
        LOGIC_ANALYST_ID
    }

    fn display_name(&self) -> &str {
        "Logic Analyst"
    }

    async fn analyze(&self, input: PersonaInput) -> Result<PersonaStream> {
        self.pipeline.run(input).await
    }
}
