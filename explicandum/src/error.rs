use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplicandumError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Stance extraction error: {0}")]
    Extraction(String),

    #[error("Persona '{persona_id}' failed: {cause}")]
    Persona { persona_id: String, cause: String },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ExplicandumError {
    /// Build a scoped persona failure.
    pub fn persona(persona_id: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Persona {
            persona_id: persona_id.into(),
            cause: cause.into(),
        }
    }
}

impl IntoResponse for ExplicandumError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ExplicandumError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ExplicandumError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ExplicandumError::Http(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            ExplicandumError::Json(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ExplicandumError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ExplicandumError::Llm(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ExplicandumError::LlmUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ExplicandumError::LlmRateLimit { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!("LLM rate limit exceeded, retry after {retry_after:?} seconds"),
            ),
            ExplicandumError::Retrieval(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ExplicandumError::Extraction(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ExplicandumError::Persona { .. } => (StatusCode::BAD_GATEWAY, self.to_string()),
            ExplicandumError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ExplicandumError>;
