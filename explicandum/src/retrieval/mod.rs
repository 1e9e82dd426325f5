use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::RetrievalConfig;
use crate::error::{ExplicandumError, Result};
use crate::models::RetrievedContext;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct RetrievalResponse {
    results: Vec<RetrievedContext>,
}

/// Client for the external retrieval interface. Built unavailable when no
/// endpoint is configured; retrieval failures never fail a turn, personas
/// just run without supporting context.
#[derive(Debug, Clone)]
pub struct RetrievalProvider {
    config: Option<RetrievalConfig>,
    client: Option<reqwest::Client>,
}

impl RetrievalProvider {
    pub fn new(config: Option<&RetrievalConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable();
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();

        match client {
            Ok(client) => Self {
                config: Some(config.clone()),
                client: Some(client),
            },
            Err(error) => {
                tracing::warn!(error = %error, "Failed to build retrieval HTTP client");
                Self::unavailable()
            }
        }
    }

    pub fn unavailable() -> Self {
        Self {
            config: None,
            client: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.config.is_some()
    }

    /// Fetch supporting context for a query. Returns an empty list when the
    /// provider is unconfigured or the call fails.
    pub async fn retrieve(&self, query: &str) -> Vec<RetrievedContext> {
        if !self.is_available() {
            return Vec::new();
        }

        match self.try_retrieve(query).await {
            Ok(results) => results,
            Err(error) => {
                tracing::warn!(error = %error, "Retrieval failed, continuing without context");
                Vec::new()
            }
        }
    }

    async fn try_retrieve(&self, query: &str) -> Result<Vec<RetrievedContext>> {
        let (config, client) = match (&self.config, &self.client) {
            (Some(config), Some(client)) => (config, client),
            _ => {
                return Err(ExplicandumError::Retrieval(
                    "Retrieval is not configured".to_string(),
                ))
            }
        };

        let mut request = client.post(&config.base_url).json(&RetrievalRequest {
            query,
            top_k: config.top_k,
        });

        if let Some(api_key) = &config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(ExplicandumError::Retrieval(format!(
                "Retrieval endpoint returned {}",
                response.status()
            )));
        }

        let body: RetrievalResponse = response.json().await?;

        let mut results = body.results;
        results.truncate(config.top_k);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> RetrievalConfig {
        RetrievalConfig {
            base_url,
            api_key: None,
            top_k: 2,
            timeout_secs: 5,
        }
    }

    #[test]
    fn unconfigured_provider_is_unavailable() {
        let provider = RetrievalProvider::new(None);
        assert!(!provider.is_available());
    }

    #[tokio::test]
    async fn unconfigured_provider_returns_empty() {
        let provider = RetrievalProvider::unavailable();
        assert!(provider.retrieve("free will").await.is_empty());
    }

    #[tokio::test]
    async fn retrieve_parses_ranked_results() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/retrieve"))
            .and(body_partial_json(serde_json::json!({
                "query": "free will",
                "topK": 2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"text": "Compatibilism", "sourceId": "doc_1", "score": 0.9},
                    {"text": "Hard determinism", "sourceId": "doc_2", "score": 0.7}
                ]
            })))
            .mount(&server)
            .await;

        let provider = RetrievalProvider::new(Some(&config(format!("{}/retrieve", server.uri()))));

        let results = provider.retrieve("free will").await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source_id, "doc_1");
        assert_eq!(results[1].score, 0.7);
    }

    #[tokio::test]
    async fn retrieve_truncates_to_top_k() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/retrieve"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"text": "a", "sourceId": "doc_1", "score": 0.9},
                    {"text": "b", "sourceId": "doc_2", "score": 0.8},
                    {"text": "c", "sourceId": "doc_3", "score": 0.7}
                ]
            })))
            .mount(&server)
            .await;

        let provider = RetrievalProvider::new(Some(&config(format!("{}/retrieve", server.uri()))));
        let results = provider.retrieve("anything").await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn upstream_error_degrades_to_empty() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/retrieve"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = RetrievalProvider::new(Some(&config(format!("{}/retrieve", server.uri()))));
        assert!(provider.retrieve("anything").await.is_empty());
    }
}
