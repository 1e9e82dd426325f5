use std::sync::Arc;

use crate::config::Config;
use crate::extraction::StanceExtractor;
use crate::llm::LlmProvider;
use crate::orchestrator::Orchestrator;
use crate::personas::{LogicAnalyst, PersonaAgent, PhilosophyExpert};
use crate::retrieval::RetrievalProvider;
use crate::store::{ConversationStore, StanceStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: LlmProvider,
    pub conversations: Arc<dyn ConversationStore>,
    pub stances: Arc<dyn StanceStore>,
    pub retrieval: Arc<RetrievalProvider>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(
        config: Config,
        conversations: Arc<dyn ConversationStore>,
        stances: Arc<dyn StanceStore>,
        retrieval: RetrievalProvider,
        llm: LlmProvider,
    ) -> Self {
        let config = Arc::new(config);
        let retrieval = Arc::new(retrieval);

        let extractor = Arc::new(StanceExtractor::new(
            llm.clone(),
            config.extraction.clone(),
        ));

        let personas: Vec<Arc<dyn PersonaAgent>> = vec![
            Arc::new(LogicAnalyst::new(llm.clone())),
            Arc::new(PhilosophyExpert::new(llm.clone())),
        ];

        let orchestrator = Arc::new(Orchestrator::new(
            config.orchestrator.clone(),
            conversations.clone(),
            stances.clone(),
            retrieval.clone(),
            extractor,
            personas,
        ));

        Self {
            config,
            llm,
            conversations,
            stances,
            retrieval,
            orchestrator,
        }
    }
}
