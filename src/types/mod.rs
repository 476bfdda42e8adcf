//! Shared data model: feedback records, ratings, sentiment, reports.

pub mod analytics;
pub mod feedback;
pub mod period;

pub use analytics::{
    AnalyticsReport, RatingHistogram, RecentComment, SentimentBreakdown, TrendSeries,
};
pub use feedback::{
    Category, FeedbackRecord, InvalidRating, NewFeedback, Rating, Ratings, Sentiment,
    SentimentLabel, DEFAULT_RESTAURANT_ID,
};
pub use period::Period;
