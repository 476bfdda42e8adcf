//! Feedback ingestion
//!
//! Validates a raw submission, classifies its comment exactly once and hands
//! the result to the store. Nothing is written when validation fails.

use serde::Deserialize;
use std::sync::Arc;

use crate::config::IngestConfig;
use crate::sentiment::SentimentClassifier;
use crate::storage::{FeedbackStore, StorageError};
use crate::types::{FeedbackRecord, NewFeedback, Rating, Ratings, DEFAULT_RESTAURANT_ID};

/// Submission body as received from a client. Every field is optional here so
/// that validation can report all problems at once.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[serde(default)]
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub ratings: Option<RawRatings>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Unvalidated rating values; symbolic names or glyphs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRatings {
    #[serde(default)]
    pub food: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub atmosphere: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The submission is malformed. Lists every offending field.
    #[error("invalid feedback: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Validates, classifies and persists submissions.
#[derive(Clone)]
pub struct FeedbackIngestor {
    store: Arc<dyn FeedbackStore>,
    classifier: SentimentClassifier,
    max_comment_chars: usize,
}

impl FeedbackIngestor {
    pub fn new(
        store: Arc<dyn FeedbackStore>,
        classifier: SentimentClassifier,
        config: &IngestConfig,
    ) -> Self {
        Self {
            store,
            classifier,
            max_comment_chars: config.max_comment_chars,
        }
    }

    /// Validate and persist one submission.
    pub fn ingest(&self, request: IngestRequest) -> Result<FeedbackRecord, IngestError> {
        let (restaurant_id, ratings, comment) = self.validate(request)?;
        let sentiment = self.classifier.classify(&comment);

        let record = self.store.insert(NewFeedback {
            restaurant_id,
            ratings,
            comment,
            sentiment,
        })?;

        tracing::info!(
            id = %record.id,
            restaurant = %record.restaurant_id,
            sentiment = %record.sentiment_label,
            "Feedback received"
        );
        Ok(record)
    }

    /// Check a submission and normalize its defaults.
    pub fn validate(
        &self,
        request: IngestRequest,
    ) -> Result<(String, Ratings, String), IngestError> {
        let mut errors = Vec::new();

        let ratings = match request.ratings {
            None => {
                errors.push("ratings are required".to_string());
                None
            }
            Some(raw) => {
                let food = parse_rating("food", raw.food.as_deref(), &mut errors);
                let service = parse_rating("service", raw.service.as_deref(), &mut errors);
                let atmosphere =
                    parse_rating("atmosphere", raw.atmosphere.as_deref(), &mut errors);
                match (food, service, atmosphere) {
                    (Some(f), Some(s), Some(a)) => Some(Ratings::new(f, s, a)),
                    _ => None,
                }
            }
        };

        let comment = request.comment.unwrap_or_default();
        let comment_chars = comment.chars().count();
        if comment_chars > self.max_comment_chars {
            errors.push(format!(
                "comment is {} characters, the limit is {}",
                comment_chars, self.max_comment_chars
            ));
        }

        let restaurant_id = request
            .restaurant_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_RESTAURANT_ID.to_string());

        match ratings {
            Some(ratings) if errors.is_empty() => Ok((restaurant_id, ratings, comment)),
            _ => {
                tracing::debug!(errors = ?errors, "Rejected feedback submission");
                Err(IngestError::Validation(errors))
            }
        }
    }
}

fn parse_rating(field: &str, raw: Option<&str>, errors: &mut Vec<String>) -> Option<Rating> {
    match raw {
        None => {
            errors.push(format!("ratings.{field} is required"));
            None
        }
        Some(value) => match value.parse::<Rating>() {
            Ok(rating) => Some(rating),
            Err(e) => {
                errors.push(format!("ratings.{field}: {e}"));
                None
            }
        },
    }
}
