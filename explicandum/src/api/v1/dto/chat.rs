use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stances::StanceDeltaDto;

/// `POST /api/v1/chat` request body.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Conversation to continue. When omitted, the server mints a new id
    /// and announces it in the stream's `started` event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = String)]
    pub conversation_id: Option<Uuid>,
    /// The user's message.
    pub message: String,
}

/// `POST /api/v1/chat:extract-stance` request body.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractStanceRequest {
    #[schema(value_type = String)]
    pub conversation_id: Uuid,
    /// Message to extract stances from. Persisted as a user turn.
    pub message: String,
}

/// `POST /api/v1/chat:extract-stance` response payload.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractStanceResponse {
    #[schema(value_type = String)]
    pub conversation_id: Uuid,
    /// Deltas applied to the stance store. Empty when the message expressed
    /// no stance or extraction is unavailable.
    pub deltas: Vec<StanceDeltaDto>,
}
