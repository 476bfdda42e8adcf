//! Feedback endpoints: submit, list, CSV export

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{parse_date_bound, ApiState, FeedbackQuery};
use crate::api::admin::AdminSession;
use crate::api::envelope::{ApiErrorResponse, ApiResponse};
use crate::export::{export_filename, to_csv};
use crate::ingest::{IngestError, IngestRequest};
use crate::storage::FeedbackFilter;
use crate::types::{FeedbackRecord, Period};

// ============================================================================
// Submission
// ============================================================================

/// POST /api/feedback - Submit feedback (public)
pub async fn submit_feedback(
    State(state): State<ApiState>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return ApiErrorResponse::bad_request(rejection.body_text()),
    };

    match state.ingestor.ingest(request) {
        Ok(record) => ApiResponse::created(record),
        Err(IngestError::Validation(errors)) => ApiErrorResponse::validation(errors.join("; ")),
        Err(IngestError::Storage(e)) => ApiErrorResponse::storage(&e),
    }
}

// ============================================================================
// Listing
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FeedbackListResponse {
    pub feedback: Vec<FeedbackRecord>,
    pub count: usize,
}

/// GET /api/feedback - Most recent matching records, newest first (admin)
pub async fn list_feedback(
    _admin: AdminSession,
    State(state): State<ApiState>,
    query: Result<Query<FeedbackQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return ApiErrorResponse::bad_request(rejection.body_text()),
    };

    let tz = state.aggregator.timezone();
    let since = match query.start_date.as_deref().map(|d| parse_date_bound(d, tz, false)) {
        Some(Err(msg)) => return ApiErrorResponse::bad_request(format!("startDate: {msg}")),
        Some(Ok(t)) => Some(t),
        None => None,
    };
    let until = match query.end_date.as_deref().map(|d| parse_date_bound(d, tz, true)) {
        Some(Err(msg)) => return ApiErrorResponse::bad_request(format!("endDate: {msg}")),
        Some(Ok(t)) => Some(t),
        None => None,
    };

    let filter = FeedbackFilter::for_restaurant(query.restaurant())
        .since(since)
        .until(until)
        .limit(state.config.storage.list_limit);

    match state.store.find(&filter) {
        Ok(feedback) => {
            let count = feedback.len();
            ApiResponse::ok(FeedbackListResponse { feedback, count })
        }
        Err(e) => ApiErrorResponse::storage(&e),
    }
}

// ============================================================================
// Export
// ============================================================================

/// Restaurant + period filter used by export and analytics.
pub fn period_filter(
    state: &ApiState,
    query: &FeedbackQuery,
    now: DateTime<Utc>,
) -> (Period, FeedbackFilter) {
    let period = Period::parse_lenient(query.period.as_deref());
    let since = period.lower_bound(now, state.aggregator.timezone());
    (
        period,
        FeedbackFilter::for_restaurant(query.restaurant()).since(since),
    )
}

/// GET /api/feedback/export - CSV download (admin)
pub async fn export_feedback(
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
    let records = match state.store.find(&filter) {
        Ok(records) => records,
        Err(e) => return ApiErrorResponse::storage(&e),
    };

    let tz = state.aggregator.timezone();
    let filename = export_filename(period, now.with_timezone(&tz).date_naive());
    tracing::info!(rows = records.len(), period = %period, file = %filename, "Feedback export");

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        to_csv(&records, tz),
    )
        .into_response()
}
