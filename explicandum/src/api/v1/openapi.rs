use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use crate::models;

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Explicandum API",
        version = "1.0.0",
        description = "Multi-persona philosophical reasoning service. Streams labeled persona responses and tracks the user's stances across a conversation.",
    ),
    paths(
        handlers::health::health_check,
        handlers::chat::chat,
        handlers::chat::extract_stance,
        handlers::stances::list_stances,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        response::ResponseMeta,
        // Domain
        models::Polarity,
        models::StanceOperation,
        // Chat
        dto::chat::ChatRequest,
        dto::chat::ExtractStanceRequest,
        dto::chat::ExtractStanceResponse,
        // Stances
        dto::stances::StanceDto,
        dto::stances::StanceDeltaDto,
        dto::stances::ListStancesQuery,
        dto::stances::ListStancesResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::LlmStatus,
        handlers::health::RetrievalStatus,
        handlers::health::ExtractionStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "chat", description = "Persona dispatch and streaming chat"),
        (name = "stances", description = "Stance listing and history"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
