//! API route table.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};

/// Build the API router.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        // Feedback
        .route(
            "/api/feedback",
            post(handlers::submit_feedback).get(handlers::list_feedback),
        )
        .route("/api/feedback/export", get(handlers::export_feedback))
        // Analytics
        .route("/api/analytics", get(handlers::get_analytics))
        // Auth
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .fallback(handlers::not_found)
        .with_state(state)
}
