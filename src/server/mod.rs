//! HTTP server wiring.

pub mod api;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(api::chat))
        .route("/api/chat/cancel", post(api::cancel_chat))
        .route(
            "/api/chat/projects",
            get(api::list_projects)
                .post(api::create_project)
                .delete(api::delete_project),
        )
        .route(
            "/api/chat/history",
            get(api::get_history).delete(api::clear_history),
        )
        .route("/api/health", get(api::health))
        // The chat GUI is served from another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
