//! Search index projection interface.
//!
//! The index is a produced-to collaborator: it receives fact-creation events
//! and retraction-projection updates, best-effort and eventually consistent.
//! Projection failures never surface to the caller of the originating write;
//! they are logged and retried (see `retraction`).

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::types::{FactId, FactRecord};

/// Error type for index projections.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IndexError {
    /// The index rejected or could not accept the projection.
    #[error("index unavailable: {reason}")]
    Unavailable {
        /// Human-readable failure reason.
        reason: String,
    },
}

/// Trait for search index backends.
///
/// Both operations must be idempotent: the kernel delivers them
/// at-least-once.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Index a newly created fact together with its applied ACL subjects.
    async fn index_fact(&self, fact: &FactRecord, acl: &[Uuid]) -> Result<(), IndexError>;

    /// Update the derived "is-retracted" projection of a fact.
    async fn set_retracted(&self, fact_id: &FactId, retracted: bool) -> Result<(), IndexError>;
}

/// Index that drops all projections.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpIndex;

#[async_trait]
impl SearchIndex for NoOpIndex {
    async fn index_fact(&self, _fact: &FactRecord, _acl: &[Uuid]) -> Result<(), IndexError> {
        Ok(())
    }

    async fn set_retracted(&self, _fact_id: &FactId, _retracted: bool) -> Result<(), IndexError> {
        Ok(())
    }
}

/// Index that records projections for test assertions, with optional
/// failure injection.
#[derive(Debug, Default)]
pub struct RecordingIndex {
    indexed: Mutex<Vec<(FactId, Vec<Uuid>)>>,
    retracted: Mutex<Vec<(FactId, bool)>>,
    /// Number of upcoming calls that fail before the index recovers.
    failures_remaining: Mutex<usize>,
}

impl RecordingIndex {
    /// Create an empty recording index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls fail with `IndexError::Unavailable`.
    pub fn fail_next(&self, count: usize) {
        *self.failures_remaining.lock() = count;
    }

    /// Fact ids indexed so far, with their applied ACL subjects.
    pub fn indexed(&self) -> Vec<(FactId, Vec<Uuid>)> {
        self.indexed.lock().clone()
    }

    /// Retraction projections recorded so far.
    pub fn retraction_updates(&self) -> Vec<(FactId, bool)> {
        self.retracted.lock().clone()
    }

    fn check_failure(&self) -> Result<(), IndexError> {
        let mut remaining = self.failures_remaining.lock();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(IndexError::Unavailable {
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for RecordingIndex {
    async fn index_fact(&self, fact: &FactRecord, acl: &[Uuid]) -> Result<(), IndexError> {
        self.check_failure()?;
        self.indexed.lock().push((fact.id, acl.to_vec()));
        Ok(())
    }

    async fn set_retracted(&self, fact_id: &FactId, retracted: bool) -> Result<(), IndexError> {
        self.check_failure()?;
        self.retracted.lock().push((*fact_id, retracted));
        Ok(())
    }
}
