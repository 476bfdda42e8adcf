//! Analytics aggregation
//!
//! Turns an already-filtered set of feedback records into an
//! [`AnalyticsReport`]: satisfaction percentage, per-category rating
//! histograms, sentiment distribution, daily trends and the latest comments.
//!
//! The aggregator is pure and synchronous; it never touches the store.

pub mod trends;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::borrow::Cow;

use crate::config::AnalyticsConfig;
use crate::types::{
    AnalyticsReport, FeedbackRecord, RatingHistogram, RecentComment, SentimentBreakdown,
};

pub use trends::{daily_trends, day_label};

/// Report builder configured with the reporting policy.
#[derive(Debug, Clone)]
pub struct Aggregator {
    tz: FixedOffset,
    trend_days: u32,
    recent_comments_limit: usize,
    positive_threshold: f64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(&AnalyticsConfig::default())
    }
}

impl Aggregator {
    pub fn new(config: &AnalyticsConfig) -> Self {
        let tz = config.timezone().unwrap_or_else(|| {
            tracing::warn!(
                offset = config.utc_offset_minutes,
                "Invalid reporting offset, using UTC"
            );
            Utc.fix()
        });
        Self {
            tz,
            trend_days: config.trend_days,
            recent_comments_limit: config.recent_comments_limit,
            positive_threshold: config.positive_threshold,
        }
    }

    /// Reporting timezone for calendar boundaries.
    pub const fn timezone(&self) -> FixedOffset {
        self.tz
    }

    /// Whether a record counts towards overall satisfaction.
    pub fn is_satisfied(&self, record: &FeedbackRecord) -> bool {
        record.ratings.mean_score() >= self.positive_threshold
    }

    /// Aggregate `records` as of `now`.
    ///
    /// Input order does not matter; recent comments are always taken newest
    /// first. An empty slice yields a zero-valued report of the same shape.
    pub fn aggregate(&self, records: &[FeedbackRecord], now: DateTime<Utc>) -> AnalyticsReport {
        let records = newest_first(records);

        let mut food_ratings = RatingHistogram::default();
        let mut service_ratings = RatingHistogram::default();
        let mut atmosphere_ratings = RatingHistogram::default();
        let mut sentiment_breakdown = SentimentBreakdown::default();
        let mut satisfied = 0usize;

        for record in records.iter() {
            food_ratings.record(record.ratings.food);
            service_ratings.record(record.ratings.service);
            atmosphere_ratings.record(record.ratings.atmosphere);
            sentiment_breakdown.record(record.sentiment_label);
            if self.is_satisfied(record) {
                satisfied += 1;
            }
        }

        let total = records.len();
        let overall_satisfaction = if total == 0 {
            0
        } else {
            (satisfied as f64 / total as f64 * 100.0).round() as u32
        };

        let today = now.with_timezone(&self.tz).date_naive();
        let trends = daily_trends(&records, today, self.trend_days, self.tz);

        let recent_comments = records
            .iter()
            .filter(|r| r.has_comment())
            .take(self.recent_comments_limit)
            .map(|r| RecentComment {
                id: r.id.clone(),
                comment: r.comment.clone(),
                sentiment: r.sentiment_label,
                sentiment_score: r.sentiment_score,
                ratings: r.ratings,
                created_at: r.created_at,
            })
            .collect();

        tracing::debug!(
            total,
            satisfaction = overall_satisfaction,
            "Analytics report built"
        );

        AnalyticsReport {
            overall_satisfaction,
            total_feedback: total,
            food_ratings,
            service_ratings,
            atmosphere_ratings,
            sentiment_breakdown,
            trends,
            recent_comments,
        }
    }
}

/// Borrow when already newest first, otherwise sort a copy.
fn newest_first(records: &[FeedbackRecord]) -> Cow<'_, [FeedbackRecord]> {
    if records
        .windows(2)
        .all(|w| w[0].created_at >= w[1].created_at)
    {
        Cow::Borrowed(records)
    } else {
        let mut sorted = records.to_vec();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Cow::Owned(sorted)
    }
}
