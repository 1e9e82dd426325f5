use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::extraction::conflict::TopicMatcher;
use crate::extraction::types::ProposedStance;
use crate::llm::{prompts, LlmProvider};
use crate::models::{Stance, StanceDelta, StanceOperation, Turn};

/// Extracts stance changes from a user turn by comparing LLM proposals
/// against the currently active stances.
///
/// Extraction is best-effort: any failure logs and yields no deltas, and
/// the same turn re-extracted against an unchanged stance set yields no
/// deltas either.
pub struct StanceExtractor {
    llm: LlmProvider,
    config: ExtractionConfig,
    matcher: TopicMatcher,
}

impl StanceExtractor {
    pub fn new(llm: LlmProvider, config: ExtractionConfig) -> Self {
        Self {
            llm,
            config,
            matcher: TopicMatcher::new(),
        }
    }

    /// Propose stance deltas for a user turn. Never fails the caller.
    pub async fn extract(&self, turn: &Turn, active: &[Stance]) -> Vec<StanceDelta> {
        if !self.config.enabled {
            return Vec::new();
        }

        if !self.llm.is_available() {
            tracing::debug!("LLM unavailable, skipping stance extraction");
            return Vec::new();
        }

        match self.try_extract(turn, active).await {
            Ok(deltas) => {
                if !deltas.is_empty() {
                    tracing::info!(
                        turn_id = %turn.id,
                        delta_count = deltas.len(),
                        "Extracted stance deltas"
                    );
                }
                deltas
            }
            Err(error) => {
                tracing::warn!(turn_id = %turn.id, error = %error, "Stance extraction failed");
                Vec::new()
            }
        }
    }

    async fn try_extract(&self, turn: &Turn, active: &[Stance]) -> Result<Vec<StanceDelta>> {
        let prompt = prompts::stance_extraction_prompt(&turn.text, active);
        let proposals: Vec<ProposedStance> = self.llm.complete_structured(&prompt).await?;

        // Resolve each proposal against a working copy of the active set so
        // that several proposals on one topic within a single turn chain
        // correctly instead of colliding at the store.
        let mut working: Vec<Stance> = active.to_vec();
        let mut deltas = Vec::new();

        for proposal in proposals {
            let Some(delta) = self.resolve_proposal(turn, &proposal, &working) else {
                continue;
            };

            match delta.operation {
                StanceOperation::Add | StanceOperation::Supersede => {
                    working.retain(|stance| stance.topic != delta.stance.topic);
                    working.push(delta.stance.clone());
                }
                StanceOperation::Retract => {
                    working.retain(|stance| stance.topic != delta.stance.topic);
                }
            }

            deltas.push(delta);
        }

        Ok(deltas)
    }

    fn resolve_proposal(
        &self,
        turn: &Turn,
        proposal: &ProposedStance,
        active: &[Stance],
    ) -> Option<StanceDelta> {
        let Some(polarity) = proposal.parsed_polarity() else {
            tracing::warn!(polarity = %proposal.polarity, "Dropping proposal with unknown polarity");
            return None;
        };

        let confidence = proposal.confidence.clamp(0.0, 1.0);
        if confidence < self.config.confidence_threshold {
            tracing::debug!(
                topic = %proposal.topic,
                confidence,
                "Dropping proposal below confidence threshold"
            );
            return None;
        }

        let topic = proposal.normalized_topic();
        if topic.is_empty() || proposal.proposition.trim().is_empty() {
            return None;
        }

        let existing = self.matcher.match_topic(&topic, active);

        let Some(existing) = existing else {
            if proposal.retracts {
                // Nothing to retract.
                return None;
            }
            let stance = Stance::new(topic, proposal.proposition.trim(), polarity, confidence, &turn.id);
            return Some(StanceDelta {
                operation: StanceOperation::Add,
                stance,
            });
        };

        // Reuse the existing chain key even when the proposal phrased the
        // topic differently.
        let stance = Stance::new(
            &existing.topic,
            proposal.proposition.trim(),
            polarity,
            confidence,
            &turn.id,
        )
        .superseding(&existing.id);

        if proposal.retracts {
            return Some(StanceDelta {
                operation: StanceOperation::Retract,
                stance,
            });
        }

        // Unchanged stance: re-extraction is a no-op.
        if polarity == existing.polarity
            && self
                .matcher
                .propositions_equivalent(&proposal.proposition, &existing.proposition)
        {
            return None;
        }

        // A contradicting proposal must be at least as confident as what it
        // replaces; otherwise the established stance wins.
        if polarity.conflicts_with(existing.polarity) && confidence < existing.confidence {
            tracing::debug!(
                topic = %existing.topic,
                new_confidence = confidence,
                existing_confidence = existing.confidence,
                "Dropping lower-confidence contradicting proposal"
            );
            return None;
        }

        Some(StanceDelta {
            operation: StanceOperation::Supersede,
            stance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::models::Polarity;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn llm_response(content: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content.to_string()
                },
                "finish_reason": "stop"
            }]
        })
    }

    async fn extractor_against(server: &MockServer) -> StanceExtractor {
        let config = LlmConfig {
            model: "test-model".to_string(),
            api_key: None,
            base_url: Some(server.uri()),
            timeout_secs: 5,
            max_retries: 0,
        };
        StanceExtractor::new(
            LlmProvider::new(Some(&config)),
            ExtractionConfig {
                enabled: true,
                confidence_threshold: 0.3,
            },
        )
    }

    #[tokio::test]
    async fn new_topic_produces_add_delta() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(llm_response(json!([
                {"topic": "free will", "proposition": "Free will exists", "polarity": "affirmed", "confidence": 0.85, "retracts": false}
            ]))))
            .mount(&server)
            .await;

        let extractor = extractor_against(&server).await;
        let turn = Turn::user("I believe free will exists");

        let deltas = extractor.extract(&turn, &[]).await;
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].operation, StanceOperation::Add);
        assert_eq!(deltas[0].stance.topic, "free will");
        assert_eq!(deltas[0].stance.polarity, Polarity::Affirmed);
        assert_eq!(deltas[0].stance.source_turn_id, turn.id);
        assert!(deltas[0].stance.supersedes.is_none());
    }

    #[tokio::test]
    async fn contradiction_supersedes_prior_stance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(llm_response(json!([
                {"topic": "ravens", "proposition": "Ravens are not always black", "polarity": "denied", "confidence": 0.9, "retracts": false}
            ]))))
            .mount(&server)
            .await;

        let extractor = extractor_against(&server).await;
        let prior = Stance::new("ravens", "Ravens are always black", Polarity::Affirmed, 0.8, "t1");
        let turn = Turn::user("Actually, I saw a white raven yesterday");

        let deltas = extractor.extract(&turn, &[prior.clone()]).await;
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].operation, StanceOperation::Supersede);
        assert_eq!(deltas[0].stance.supersedes.as_deref(), Some(prior.id.as_str()));
        assert_eq!(deltas[0].stance.topic, "ravens");
    }

    #[tokio::test]
    async fn lower_confidence_contradiction_is_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(llm_response(json!([
                {"topic": "ravens", "proposition": "Ravens are not always black", "polarity": "denied", "confidence": 0.4, "retracts": false}
            ]))))
            .mount(&server)
            .await;

        let extractor = extractor_against(&server).await;
        let prior = Stance::new("ravens", "Ravens are always black", Polarity::Affirmed, 0.9, "t1");
        let turn = Turn::user("Maybe some ravens are not black?");

        let deltas = extractor.extract(&turn, &[prior]).await;
        assert!(deltas.is_empty());
    }

    #[tokio::test]
    async fn proposals_below_threshold_are_discarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(llm_response(json!([
                {"topic": "free will", "proposition": "Free will exists", "polarity": "affirmed", "confidence": 0.1, "retracts": false}
            ]))))
            .mount(&server)
            .await;

        let extractor = extractor_against(&server).await;
        let turn = Turn::user("Perhaps free will exists, who knows");

        let deltas = extractor.extract(&turn, &[]).await;
        assert!(deltas.is_empty());
    }

    #[tokio::test]
    async fn explicit_retraction_produces_retract_delta() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(llm_response(json!([
                {"topic": "free will", "proposition": "Free will exists", "polarity": "uncertain", "confidence": 0.9, "retracts": true}
            ]))))
            .mount(&server)
            .await;

        let extractor = extractor_against(&server).await;
        let prior = Stance::new("free will", "Free will exists", Polarity::Affirmed, 0.8, "t1");
        let turn = Turn::user("Forget what I said about free will");

        let deltas = extractor.extract(&turn, &[prior.clone()]).await;
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].operation, StanceOperation::Retract);
        assert_eq!(deltas[0].stance.supersedes.as_deref(), Some(prior.id.as_str()));
    }

    #[tokio::test]
    async fn retraction_without_prior_stance_is_noop() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(llm_response(json!([
                {"topic": "free will", "proposition": "Free will exists", "polarity": "uncertain", "confidence": 0.9, "retracts": true}
            ]))))
            .mount(&server)
            .await;

        let extractor = extractor_against(&server).await;
        let turn = Turn::user("Forget what I said about free will");

        let deltas = extractor.extract(&turn, &[]).await;
        assert!(deltas.is_empty());
    }

    #[tokio::test]
    async fn re_extraction_of_unchanged_stance_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(llm_response(json!([
                {"topic": "ravens", "proposition": "Ravens are always black", "polarity": "affirmed", "confidence": 0.85, "retracts": false}
            ]))))
            .mount(&server)
            .await;

        let extractor = extractor_against(&server).await;
        let prior = Stance::new("ravens", "Ravens are always black", Polarity::Affirmed, 0.8, "t1");
        let turn = Turn::user("As I said, ravens are always black");

        let deltas = extractor.extract(&turn, &[prior]).await;
        assert!(deltas.is_empty());
    }

    #[tokio::test]
    async fn llm_failure_yields_empty_deltas() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let extractor = extractor_against(&server).await;
        let turn = Turn::user("I believe free will exists");

        let deltas = extractor.extract(&turn, &[]).await;
        assert!(deltas.is_empty());
    }

    #[tokio::test]
    async fn malformed_llm_json_yields_empty_deltas() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(llm_response(json!({"not": "an array"}))),
            )
            .mount(&server)
            .await;

        let extractor = extractor_against(&server).await;
        let turn = Turn::user("I believe free will exists");

        let deltas = extractor.extract(&turn, &[]).await;
        assert!(deltas.is_empty());
    }

    #[tokio::test]
    async fn disabled_extraction_skips_llm_entirely() {
        let extractor = StanceExtractor::new(
            LlmProvider::unavailable("unused"),
            ExtractionConfig {
                enabled: false,
                confidence_threshold: 0.3,
            },
        );
        let turn = Turn::user("I believe free will exists");

        let deltas = extractor.extract(&turn, &[]).await;
        assert!(deltas.is_empty());
    }

    #[tokio::test]
    async fn unknown_polarity_is_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(llm_response(json!([
                {"topic": "free will", "proposition": "Free will exists", "polarity": "probably", "confidence": 0.9, "retracts": false}
            ]))))
            .mount(&server)
            .await;

        let extractor = extractor_against(&server).await;
        let turn = Turn::user("I believe free will exists");

        let deltas = extractor.extract(&turn, &[]).await;
        assert!(deltas.is_empty());
    }
}
