//! FeelRate: restaurant feedback collection and satisfaction analytics
//!
//! ## Architecture
//!
//! - **Ingestion**: validates submissions and classifies comment sentiment once
//! - **Storage**: append-only feedback store (sled or in-memory)
//! - **Analytics**: pure aggregation of stored records into a report
//! - **API**: Axum HTTP surface with bearer-session admin auth and CSV export

pub mod analytics;
pub mod api;
pub mod auth;
pub mod config;
pub mod export;
pub mod ingest;
pub mod sentiment;
pub mod storage;
pub mod types;

pub use analytics::Aggregator;
pub use config::AppConfig;
pub use ingest::{FeedbackIngestor, IngestError, IngestRequest};
pub use sentiment::{SentimentClassifier, SentimentScorer};
pub use storage::{
    FeedbackFilter, FeedbackStore, InMemoryFeedbackStore, SledFeedbackStore, StorageError,
};
pub use types::{
    AnalyticsReport, FeedbackRecord, NewFeedback, Period, Rating, Ratings, Sentiment,
    SentimentLabel,
};
