//! In-memory feedback store
//!
//! Thread-safe via `RwLock`. Not durable; data is lost on restart.

use chrono::{DateTime, Utc};
use std::sync::RwLock;

use super::{new_record_id, FeedbackFilter, FeedbackStore, StorageError};
use crate::types::{FeedbackRecord, NewFeedback};

#[derive(Debug, Default)]
pub struct InMemoryFeedbackStore {
    /// Kept sorted oldest first.
    records: RwLock<Vec<FeedbackRecord>>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackStore for InMemoryFeedbackStore {
    fn insert_at(
        &self,
        feedback: NewFeedback,
        created_at: DateTime<Utc>,
    ) -> Result<FeedbackRecord, StorageError> {
        let record = FeedbackRecord::from_new(feedback, new_record_id().to_string(), created_at);

        let mut store = self
            .records
            .write()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;

        let pos = store.partition_point(|r| r.created_at <= created_at);
        store.insert(pos, record.clone());

        Ok(record)
    }

    fn find(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackRecord>, StorageError> {
        let store = self
            .records
            .read()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;

        Ok(store
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<usize, StorageError> {
        self.records
            .read()
            .map(|s| s.len())
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rating, Ratings, Sentiment};
    use chrono::Duration;

    fn new_feedback(restaurant: &str) -> NewFeedback {
        NewFeedback {
            restaurant_id: restaurant.to_string(),
            ratings: Ratings::new(Rating::Positive, Rating::Neutral, Rating::Negative),
            comment: String::new(),
            sentiment: Sentiment::NEUTRAL,
        }
    }

    #[test]
    fn test_insert_assigns_id_and_timestamp() {
        let store = InMemoryFeedbackStore::new();
        let record = store.insert(new_feedback("default")).unwrap();
        assert!(!record.id.is_empty());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_find_is_newest_first_regardless_of_insert_order() {
        let store = InMemoryFeedbackStore::new();
        let now = Utc::now();
        store.insert_at(new_feedback("a"), now - Duration::hours(2)).unwrap();
        store.insert_at(new_feedback("a"), now).unwrap();
        store.insert_at(new_feedback("a"), now - Duration::hours(1)).unwrap();

        let found = store.find(&FeedbackFilter::default()).unwrap();
        let times: Vec<_> = found.iter().map(|r| r.created_at).collect();
        assert_eq!(times, vec![now, now - Duration::hours(1), now - Duration::hours(2)]);
    }

    #[test]
    fn test_find_applies_filter_and_limit() {
        let store = InMemoryFeedbackStore::new();
        let now = Utc::now();
        for i in 0..5 {
            store.insert_at(new_feedback("a"), now - Duration::minutes(i)).unwrap();
        }
        store.insert_at(new_feedback("b"), now).unwrap();

        let filter = FeedbackFilter::for_restaurant(Some("a".to_string())).limit(3);
        let found = store.find(&filter).unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|r| r.restaurant_id == "a"));
        assert_eq!(found[0].created_at, now);
    }

    #[test]
    fn test_trait_object() {
        let store: Box<dyn FeedbackStore> = Box::new(InMemoryFeedbackStore::new());
        assert_eq!(store.backend_name(), "InMemory");
        store.insert(new_feedback("default")).unwrap();
        assert_eq!(store.find(&FeedbackFilter::default()).unwrap().len(), 1);
    }
}
