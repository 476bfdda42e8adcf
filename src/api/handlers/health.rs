//! Liveness and health endpoints

use axum::extract::State;
use axum::response::Response;
use chrono::Utc;
use serde::Serialize;

use super::ApiState;
use crate::api::envelope::{ApiErrorResponse, ApiResponse};

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

/// GET / - Liveness message
pub async fn root() -> Response {
    ApiResponse::ok(RootResponse {
        message: "FeelRate API is running",
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub records: usize,
    pub uptime_seconds: i64,
}

/// GET /api/health - Store reachability and record count
pub async fn health(State(state): State<ApiState>) -> Response {
    match state.store.count() {
        Ok(records) => ApiResponse::ok(HealthResponse {
            status: "OK",
            store: state.store.backend_name(),
            records,
            uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        }),
        Err(e) => ApiErrorResponse::storage(&e),
    }
}

/// Fallback for unknown paths.
pub async fn not_found() -> Response {
    ApiErrorResponse::not_found("No such endpoint")
}
