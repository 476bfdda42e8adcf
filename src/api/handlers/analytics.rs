//! Analytics endpoint

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Response;
use chrono::Utc;

use super::{period_filter, ApiState, FeedbackQuery};
use crate::api::admin::AdminSession;
use crate::api::envelope::{ApiErrorResponse, ApiResponse};

/// GET /api/analytics - Aggregated report for a restaurant and period (admin)
pub async fn get_analytics(
    _admin: AdminSession,
    State(state): State<ApiState>,
    query: Result<Query<FeedbackQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return ApiErrorResponse::bad_request(rejection.body_text()),
    };

    let now = Utc::now();
    let (period, filter) = period_filter(&state, &query, now);

    match state.store.find(&filter) {
        Ok(records) => {
            let report = state.aggregator.aggregate(&records, now);
            tracing::debug!(period = %period, records = records.len(), "Analytics served");
            ApiResponse::ok(report)
        }
        Err(e) => ApiErrorResponse::storage(&e),
    }
}
