use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Polarity, Stance, StanceDelta, StanceOperation};

/// Wire representation of a stance.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StanceDto {
    pub id: String,
    pub topic: String,
    pub proposition: String,
    pub polarity: Polarity,
    pub confidence: f64,
    pub source_turn_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<String>,
    pub retracted: bool,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<Stance> for StanceDto {
    fn from(stance: Stance) -> Self {
        Self {
            id: stance.id,
            topic: stance.topic,
            proposition: stance.proposition,
            polarity: stance.polarity,
            confidence: stance.confidence,
            source_turn_id: stance.source_turn_id,
            supersedes: stance.supersedes,
            retracted: stance.retracted,
            created_at: stance.created_at,
        }
    }
}

/// Wire representation of one applied stance delta.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StanceDeltaDto {
    pub operation: StanceOperation,
    pub stance: StanceDto,
}

impl From<StanceDelta> for StanceDeltaDto {
    fn from(delta: StanceDelta) -> Self {
        Self {
            operation: delta.operation,
            stance: delta.stance.into(),
        }
    }
}

/// Query parameters for the stance listing endpoint.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListStancesQuery {
    /// When true, include superseded and retracted entries.
    #[serde(default)]
    pub include_history: bool,
}

/// `GET /api/v1/conversations/{conversationId}/stances` response payload.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListStancesResponse {
    #[schema(value_type = String)]
    pub conversation_id: Uuid,
    /// Active stances, or the full log when history was requested.
    pub stances: Vec<StanceDto>,
}
