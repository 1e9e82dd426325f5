use axum::extract::{Path, Query, State};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::v1::dto::stances::{ListStancesQuery, ListStancesResponse, StanceDto};
use crate::api::v1::response::{ApiResponse, ResponseMeta};

/// `GET /api/v1/conversations/{conversationId}/stances`
///
/// Lists the conversation's active stances, or the full version-chained log
/// when `includeHistory=true`.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{conversationId}/stances",
    tag = "stances",
    params(
        ("conversationId" = String, Path, description = "Conversation id (UUID)"),
        ListStancesQuery,
    ),
    responses(
        (status = 200, description = "Stances for the conversation", body = ListStancesResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Conversation not found"),
    )
)]
pub async fn list_stances(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<ListStancesQuery>,
) -> ApiResponse<ListStancesResponse> {
    if let Err(error) = state.conversations.get(conversation_id).await {
        return error.into();
    }

    let result = if query.include_history {
        state.stances.history(conversation_id).await
    } else {
        state.stances.active_stances(conversation_id).await
    };

    match result {
        Ok(stances) => {
            let stances: Vec<StanceDto> = stances.into_iter().map(Into::into).collect();
            let total = stances.len() as u64;
            ApiResponse::success_with_meta(
                ListStancesResponse {
                    conversation_id,
                    stances,
                },
                ResponseMeta { total: Some(total) },
            )
        }
        Err(error) => error.into(),
    }
}
