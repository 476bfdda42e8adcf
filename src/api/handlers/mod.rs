//! API route handlers
//!
//! - Feedback submission, listing and CSV export
//! - Analytics report
//! - Admin login / logout
//! - Liveness and health

mod analytics;
mod auth;
mod feedback;
mod health;

pub use analytics::*;
pub use auth::*;
pub use feedback::*;
pub use health::*;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::analytics::Aggregator;
use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::ingest::FeedbackIngestor;
use crate::sentiment::SentimentClassifier;
use crate::storage::FeedbackStore;
use crate::types::period::start_of_day;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn FeedbackStore>,
    pub ingestor: FeedbackIngestor,
    pub aggregator: Arc<Aggregator>,
    pub auth: AuthService,
    pub started_at: DateTime<Utc>,
}

impl ApiState {
    /// Wire every service from `config` around `store`.
    pub fn new(config: AppConfig, store: Arc<dyn FeedbackStore>) -> Self {
        let classifier = SentimentClassifier::from_config(&config.sentiment);
        let ingestor = FeedbackIngestor::new(store.clone(), classifier, &config.ingest);
        let aggregator = Arc::new(Aggregator::new(&config.analytics));
        let auth = AuthService::from_config(&config.auth);

        Self {
            config: Arc::new(config),
            store,
            ingestor,
            aggregator,
            auth,
            started_at: Utc::now(),
        }
    }
}

// ============================================================================
// Query types
// ============================================================================

/// Query string shared by the listing, export and analytics endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub restaurant_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub period: Option<String>,
}

impl FeedbackQuery {
    /// Restaurant filter; blank means all restaurants.
    pub fn restaurant(&self) -> Option<String> {
        self.restaurant_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

/// Parse a `startDate` / `endDate` value.
///
/// RFC 3339 timestamps are taken as-is. A bare `YYYY-MM-DD` is a local
/// calendar day in `tz`: its first instant for a lower bound, its last for an
/// upper bound, so a date-only `endDate` includes the whole day.
pub fn parse_date_bound(
    raw: &str,
    tz: FixedOffset,
    upper: bool,
) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("'{raw}' is not an RFC 3339 timestamp or YYYY-MM-DD date"))?;

    let bound = if upper {
        date.succ_opt()
            .and_then(|next| start_of_day(next, tz))
            .map(|next| next - Duration::nanoseconds(1))
    } else {
        start_of_day(date, tz)
    };
    bound.ok_or_else(|| format!("'{raw}' is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_rfc3339_bound_is_exact() {
        let bound = parse_date_bound("2026-10-19T10:00:00+02:00", utc(), true).unwrap();
        assert_eq!(bound, at("2026-10-19T08:00:00Z"));
    }

    #[test]
    fn test_date_only_bounds_cover_whole_day() {
        let lower = parse_date_bound("2026-10-19", utc(), false).unwrap();
        let upper = parse_date_bound("2026-10-19", utc(), true).unwrap();
        assert_eq!(lower, at("2026-10-19T00:00:00Z"));
        assert!(upper > at("2026-10-19T23:59:59Z"));
        assert!(upper < at("2026-10-20T00:00:00Z"));
    }

    #[test]
    fn test_date_only_respects_offset() {
        let tz = FixedOffset::east_opt(-5 * 3600).unwrap();
        let lower = parse_date_bound("2026-10-19", tz, false).unwrap();
        assert_eq!(lower, at("2026-10-19T05:00:00Z"));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_date_bound("yesterday", utc(), false).is_err());
    }

    #[test]
    fn test_blank_restaurant_means_all() {
        let q = FeedbackQuery {
            restaurant_id: Some("  ".to_string()),
            ..FeedbackQuery::default()
        };
        assert_eq!(q.restaurant(), None);
    }
}
