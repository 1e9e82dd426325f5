use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub orchestrator: OrchestratorConfig,
    pub extraction: ExtractionConfig,
    pub llm: Option<LlmConfig>,
    pub retrieval: Option<RetrievalConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
}

/// LLM configuration for the reasoning-model provider
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Orchestrator policy knobs: history window, persona timeouts, and the
/// small-talk routing heuristic.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    /// Number of most recent turns supplied to each persona.
    pub history_window: usize,
    /// Independent timeout per persona invocation.
    pub persona_timeout_secs: u64,
    /// When true, purely conversational turns skip the Logic Analyst.
    pub skip_small_talk: bool,
    /// Messages at or below this word count are candidates for small talk.
    pub small_talk_max_words: usize,
}

/// Stance extractor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub enabled: bool,
    /// Proposals below this confidence are discarded as noise.
    pub confidence_threshold: f64,
}

/// Retrieval interface configuration. Absent when no endpoint is configured;
/// personas then run on history and stances alone.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub top_k: usize,
    pub timeout_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_window: 12,
            persona_timeout_secs: 30,
            skip_small_talk: false,
            small_talk_max_words: 6,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: 0.3,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("EXPLICANDUM_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("EXPLICANDUM_PORT", 3000),
                api_keys: env::var("EXPLICANDUM_API_KEYS")
                    .map(|keys| keys.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default(),
            },
            orchestrator: OrchestratorConfig {
                history_window: parse_env_or("ORCHESTRATOR_HISTORY_WINDOW", 12),
                persona_timeout_secs: parse_env_or("PERSONA_TIMEOUT_SECS", 30),
                skip_small_talk: parse_env_or("ORCHESTRATOR_SKIP_SMALL_TALK", false),
                small_talk_max_words: parse_env_or("ORCHESTRATOR_SMALL_TALK_MAX_WORDS", 6),
            },
            extraction: ExtractionConfig {
                enabled: parse_env_or("ENABLE_STANCE_EXTRACTION", true),
                confidence_threshold: parse_env_or("STANCE_CONFIDENCE_THRESHOLD", 0.3),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 30),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 3),
            }),
            retrieval: env::var("RETRIEVAL_BASE_URL").ok().map(|base_url| {
                RetrievalConfig {
                    base_url,
                    api_key: env::var("RETRIEVAL_API_KEY").ok(),
                    top_k: parse_env_or("RETRIEVAL_TOP_K", 4),
                    timeout_secs: parse_env_or("RETRIEVAL_TIMEOUT", 5),
                }
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
