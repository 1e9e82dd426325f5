use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::v1::dto::chat::{ChatRequest, ExtractStanceRequest, ExtractStanceResponse};
use crate::api::v1::response::ApiResponse;
use crate::streamer;

/// `POST /api/v1/chat`
///
/// Dispatches the message to the personas and streams the composed response
/// as Server-Sent Events. Errors before the stream opens (validation, store
/// failures) return the JSON error envelope; once streaming, failures arrive
/// as `persona_error` events or a terminal `done` event with error status.
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "SSE stream of started/chunk/critique/persona_error/done events", content_type = "text/event-stream"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let conversation_id = request.conversation_id.unwrap_or_else(Uuid::new_v4);
    match state
        .orchestrator
        .handle_turn(conversation_id, request.message)
        .await
    {
        Ok(events) => streamer::sse_response(events).into_response(),
        Err(error) => ApiResponse::<()>::from(error).into_response(),
    }
}

/// `POST /api/v1/chat:extract-stance`
///
/// Runs stance extraction for a message synchronously, without invoking the
/// personas, and applies the resulting deltas.
#[utoipa::path(
    post,
    path = "/api/v1/chat:extract-stance",
    tag = "chat",
    request_body = ExtractStanceRequest,
    responses(
        (status = 200, description = "Applied stance deltas", body = ExtractStanceResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn extract_stance(
    State(state): State<AppState>,
    Json(request): Json<ExtractStanceRequest>,
) -> ApiResponse<ExtractStanceResponse> {
    match state
        .orchestrator
        .extract_stances(request.conversation_id, &request.message)
        .await
    {
        Ok(deltas) => ApiResponse::success(ExtractStanceResponse {
            conversation_id: request.conversation_id,
            deltas: deltas.into_iter().map(Into::into).collect(),
        }),
        Err(error) => error.into(),
    }
}
