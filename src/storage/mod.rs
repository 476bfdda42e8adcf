//! Feedback record storage
//!
//! [`FeedbackStore`] abstracts persistence so the API and CLI do not care
//! which backend holds the records:
//! - [`SledFeedbackStore`]: durable store in a named sled tree
//! - [`InMemoryFeedbackStore`]: for tests and throwaway deployments
//!
//! Records are written once and never updated. Queries return newest first.

pub mod memory;
pub mod sled_store;

pub use memory::InMemoryFeedbackStore;
pub use sled_store::SledFeedbackStore;

use chrono::{DateTime, Utc};

use crate::types::{FeedbackRecord, NewFeedback};

/// Storage errors. All of them are retryable from the caller's side.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage lock poisoned: {0}")]
    Poisoned(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Query predicate for [`FeedbackStore::find`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackFilter {
    /// Exact restaurant match when set.
    pub restaurant_id: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub until: Option<DateTime<Utc>>,
    /// Maximum number of records (newest kept).
    pub limit: Option<usize>,
}

impl FeedbackFilter {
    pub fn for_restaurant(restaurant_id: Option<String>) -> Self {
        Self {
            restaurant_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn since(mut self, since: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self
    }

    #[must_use]
    pub const fn until(mut self, until: Option<DateTime<Utc>>) -> Self {
        self.until = until;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `record` satisfies the restaurant and time predicates.
    pub fn matches(&self, record: &FeedbackRecord) -> bool {
        if let Some(ref id) = self.restaurant_id {
            if record.restaurant_id != *id {
                return false;
            }
        }
        if let Some(since) = self.since {
            if record.created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.created_at > until {
                return false;
            }
        }
        true
    }
}

/// Pluggable feedback persistence.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across request handlers.
pub trait FeedbackStore: Send + Sync {
    /// Persist a new record created at `created_at`, assigning its id.
    fn insert_at(
        &self,
        feedback: NewFeedback,
        created_at: DateTime<Utc>,
    ) -> Result<FeedbackRecord, StorageError>;

    /// Persist a new record created now.
    fn insert(&self, feedback: NewFeedback) -> Result<FeedbackRecord, StorageError> {
        self.insert_at(feedback, Utc::now())
    }

    /// Records matching `filter`, newest first.
    fn find(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackRecord>, StorageError>;

    /// Total number of stored records.
    fn count(&self) -> Result<usize, StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// New record id.
pub(crate) fn new_record_id() -> uuid::Uuid {
    uuid::Uuid::new_v4()
}
