//! Admin login and logout

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use super::ApiState;
use crate::api::admin::AdminSession;
use crate::api::envelope::{ApiErrorResponse, ApiResponse};
use crate::auth::Credentials;

/// POST /api/auth/login - Exchange credentials for a bearer session
pub async fn login(
    State(state): State<ApiState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Response {
    let Json(credentials) = match payload {
        Ok(body) => body,
        Err(rejection) => return ApiErrorResponse::bad_request(rejection.body_text()),
    };

    match state.auth.authenticate(&credentials) {
        Ok(session) => ApiResponse::ok(session),
        Err(e) => ApiErrorResponse::auth(&e),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// POST /api/auth/logout - Revoke the caller's session
pub async fn logout(
    AdminSession(session): AdminSession,
    State(state): State<ApiState>,
) -> Response {
    ApiResponse::ok(LogoutResponse {
        logged_out: state.auth.logout(&session.token),
    })
}
