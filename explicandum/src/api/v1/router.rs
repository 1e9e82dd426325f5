use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let protected_routes = Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/chat:extract-stance", post(handlers::chat::extract_stance))
        .route(
            "/conversations/{conversationId}/stances",
            get(handlers::stances::list_stances),
        )
        .route_layer(middleware::from_fn_with_state(state, v1_auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
