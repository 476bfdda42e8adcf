//! Analytics report payload.
//!
//! Every report has the same shape whether or not any feedback matched:
//! histograms always carry all keys and the trend series always has one
//! point per day in the window.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::feedback::{Rating, Ratings, SentimentLabel};

/// Count of each rating value within one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingHistogram {
    pub positive_face: u32,
    pub neutral_face: u32,
    pub negative_face: u32,
}

impl RatingHistogram {
    pub fn record(&mut self, rating: Rating) {
        match rating {
            Rating::Positive => self.positive_face += 1,
            Rating::Neutral => self.neutral_face += 1,
            Rating::Negative => self.negative_face += 1,
        }
    }

    pub const fn count(&self, rating: Rating) -> u32 {
        match rating {
            Rating::Positive => self.positive_face,
            Rating::Neutral => self.neutral_face,
            Rating::Negative => self.negative_face,
        }
    }

    pub const fn total(&self) -> u32 {
        self.positive_face + self.neutral_face + self.negative_face
    }
}

/// Count of each sentiment label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentBreakdown {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

impl SentimentBreakdown {
    pub fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
    }
}

/// Daily mean rating per category, oldest day first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    /// Chart labels, e.g. "Oct 19".
    pub labels: Vec<String>,
    /// Calendar dates the points belong to.
    pub dates: Vec<NaiveDate>,
    pub food: Vec<f64>,
    pub service: Vec<f64>,
    pub atmosphere: Vec<f64>,
}

/// A commented record as shown in the admin view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentComment {
    pub id: String,
    pub comment: String,
    pub sentiment: SentimentLabel,
    pub sentiment_score: f64,
    pub ratings: Ratings,
    pub created_at: DateTime<Utc>,
}

/// Aggregated statistics over a filtered set of feedback records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    /// Percentage (0-100) of records whose mean rating is at or above the
    /// positive threshold.
    pub overall_satisfaction: u32,
    pub total_feedback: usize,
    pub food_ratings: RatingHistogram,
    pub service_ratings: RatingHistogram,
    pub atmosphere_ratings: RatingHistogram,
    pub sentiment_breakdown: SentimentBreakdown,
    pub trends: TrendSeries,
    pub recent_comments: Vec<RecentComment>,
}
