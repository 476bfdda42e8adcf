//! Durable feedback persistence on sled
//!
//! Records live in the named tree `feedback`. Keys are the creation time in
//! nanoseconds (big-endian u64) followed by the 16 id bytes, so the tree
//! iterates chronologically and time-window queries become range scans.
//! Values are JSON-serialized [`FeedbackRecord`]s.
//!
//! Inserts do not flush. Sled flushes in the background, and the server
//! flushes once more on shutdown; a crash can lose the last few writes.

use chrono::{DateTime, Utc};
use sled::Tree;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{new_record_id, FeedbackFilter, FeedbackStore, StorageError};
use crate::types::{FeedbackRecord, NewFeedback};

const TREE_NAME: &str = "feedback";

/// Sled-backed store. Cloning shares the same database handle.
#[derive(Clone)]
pub struct SledFeedbackStore {
    db: sled::Db,
    tree: Tree,
    /// Record count, seeded from one full scan at open. `Tree::len` scans.
    records: Arc<AtomicUsize>,
}

impl SledFeedbackStore {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let store = Self::from_db(db)?;
        tracing::info!(
            path = %path.display(),
            records = store.records.load(Ordering::Relaxed),
            "Feedback store opened"
        );
        Ok(store)
    }

    /// Temporary store removed on drop.
    pub fn open_temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let tree = db.open_tree(TREE_NAME)?;
        let records = Arc::new(AtomicUsize::new(tree.len()));
        Ok(Self { db, tree, records })
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

/// Creation time as an order-preserving key prefix. Pre-1970 clamps to 0.
fn time_prefix(at: DateTime<Utc>) -> [u8; 8] {
    let nanos = at
        .timestamp_nanos_opt()
        .unwrap_or_else(|| at.timestamp().saturating_mul(1_000_000_000));
    u64::try_from(nanos).unwrap_or(0).to_be_bytes()
}

fn record_key(at: DateTime<Utc>, id: &uuid::Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(&time_prefix(at));
    key.extend_from_slice(id.as_bytes());
    key
}

impl FeedbackStore for SledFeedbackStore {
    fn insert_at(
        &self,
        feedback: NewFeedback,
        created_at: DateTime<Utc>,
    ) -> Result<FeedbackRecord, StorageError> {
        let id = new_record_id();
        let record = FeedbackRecord::from_new(feedback, id.to_string(), created_at);

        let value = serde_json::to_vec(&record)?;
        if self.tree.insert(record_key(created_at, &id), value)?.is_none() {
            self.records.fetch_add(1, Ordering::Relaxed);
        }

        tracing::debug!(id = %record.id, restaurant = %record.restaurant_id, "Stored feedback");
        Ok(record)
    }

    fn find(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackRecord>, StorageError> {
        let start = filter.since.map_or_else(Vec::new, |t| time_prefix(t).to_vec());
        let end = filter.until.map_or_else(
            || vec![0xFF; 24],
            |t| {
                let mut k = time_prefix(t).to_vec();
                k.extend_from_slice(&[0xFF; 16]);
                k
            },
        );
        if start > end {
            return Ok(Vec::new());
        }

        let limit = filter.limit.unwrap_or(usize::MAX);
        let mut records = Vec::new();

        for item in self.tree.range(start..=end).rev() {
            if records.len() >= limit {
                break;
            }
            let (_key, value) = item?;
            match serde_json::from_slice::<FeedbackRecord>(&value) {
                Ok(record) if filter.matches(&record) => records.push(record),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable feedback record");
                }
            }
        }

        Ok(records)
    }

    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.records.load(Ordering::Relaxed))
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rating, Ratings, Sentiment, SentimentLabel};
    use chrono::Duration;

    fn new_feedback(restaurant: &str, comment: &str) -> NewFeedback {
        NewFeedback {
            restaurant_id: restaurant.to_string(),
            ratings: Ratings::new(Rating::Positive, Rating::Neutral, Rating::Negative),
            comment: comment.to_string(),
            sentiment: Sentiment {
                score: 3.0,
                label: SentimentLabel::Positive,
            },
        }
    }

    #[test]
    fn test_store_open() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SledFeedbackStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_and_find_roundtrip() {
        let store = SledFeedbackStore::open_temporary().unwrap();
        let created = store.insert(new_feedback("default", "lovely")).unwrap();

        let found = store.find(&FeedbackFilter::default()).unwrap();
        assert_eq!(found, vec![created]);
    }

    #[test]
    fn test_find_newest_first_with_time_window() {
        let store = SledFeedbackStore::open_temporary().unwrap();
        let now = Utc::now();
        for days in [10, 5, 3, 1, 0] {
            store
                .insert_at(new_feedback("default", ""), now - Duration::days(days))
                .unwrap();
        }

        let filter = FeedbackFilter::default()
            .since(Some(now - Duration::days(5)))
            .until(Some(now - Duration::days(1)));
        let found = store.find(&filter).unwrap();
        let times: Vec<_> = found.iter().map(|r| r.created_at).collect();
        assert_eq!(
            times,
            vec![
                now - Duration::days(1),
                now - Duration::days(3),
                now - Duration::days(5)
            ]
        );
    }

    #[test]
    fn test_same_instant_records_do_not_collide() {
        let store = SledFeedbackStore::open_temporary().unwrap();
        let now = Utc::now();
        store.insert_at(new_feedback("default", "a"), now).unwrap();
        store.insert_at(new_feedback("default", "b"), now).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_restaurant_filter_and_limit() {
        let store = SledFeedbackStore::open_temporary().unwrap();
        let now = Utc::now();
        for i in 0..4 {
            store
                .insert_at(new_feedback("north", ""), now - Duration::minutes(i))
                .unwrap();
            store
                .insert_at(new_feedback("south", ""), now - Duration::minutes(i))
                .unwrap();
        }

        let filter = FeedbackFilter::for_restaurant(Some("south".to_string())).limit(2);
        let found = store.find(&filter).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.restaurant_id == "south"));
        assert_eq!(found[0].created_at, now);
    }

    #[test]
    fn test_count_is_shared_and_reseeded_on_open() {
        let temp_dir = tempfile::tempdir().unwrap();
        {
            let store = SledFeedbackStore::open(temp_dir.path()).unwrap();
            let handle = store.clone();
            store.insert(new_feedback("default", "one")).unwrap();
            handle.insert(new_feedback("default", "two")).unwrap();
            assert_eq!(store.count().unwrap(), 2);
            assert_eq!(handle.count().unwrap(), 2);
            store.flush().unwrap();
        }
        let store = SledFeedbackStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.count().unwrap(), 2);
        store.insert(new_feedback("default", "three")).unwrap();
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_records_survive_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        {
            let store = SledFeedbackStore::open(temp_dir.path()).unwrap();
            store.insert(new_feedback("default", "see you again")).unwrap();
            store.flush().unwrap();
        }
        let store = SledFeedbackStore::open(temp_dir.path()).unwrap();
        let found = store.find(&FeedbackFilter::default()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].comment, "see you again");
    }
}
