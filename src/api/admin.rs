//! Bearer session extractor for admin endpoints

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::Response;

use super::envelope::ApiErrorResponse;
use super::handlers::ApiState;
use crate::auth::{AuthError, Session};

/// A validated admin session. Add it to a handler's arguments to require
/// `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

/// Extract Bearer token from Authorization header.
pub fn extract_bearer(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl FromRequestParts<ApiState> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            extract_bearer(parts).ok_or_else(|| ApiErrorResponse::auth(&AuthError::MissingToken))?;

        match state.auth.validate(&token) {
            Ok(session) => Ok(Self(session)),
            Err(e) => {
                tracing::debug!(error = %e, path = %parts.uri.path(), "Rejected admin request");
                Err(ApiErrorResponse::auth(&e))
            }
        }
    }
}
