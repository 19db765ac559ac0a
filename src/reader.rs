//! Direct fact lookup.
//!
//! The same visibility pipeline that guards traversal guards point lookups:
//! a fact the subject may not read, a fact outside the requested window,
//! or a retracted fact (unless requested) is indistinguishable from a fact
//! that does not exist. Error codes must not leak existence.

use std::sync::Arc;

use crate::security::SecurityContext;
use crate::store::FactStore;
use crate::traversal::{FilterError, TraversalParams, VisibilityFilter, VisibilityPredicate};
use crate::types::{FactComment, FactId, FactRecord};

/// Memo capacity for a single point lookup.
const READER_MEMO_CAPACITY: usize = 64;

/// Error type for direct fact reads.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Fact absent, invisible, or filtered out (indistinguishable).
    #[error("Fact not found: {0}")]
    FactNotFound(FactId),
    /// The visibility pipeline failed.
    #[error(transparent)]
    Filter(#[from] FilterError),
    /// Store error.
    #[error("Store error: {0}")]
    StoreError(String),
}

/// Point lookups over facts, filtered like traversal results.
pub struct FactReader<S> {
    store: Arc<S>,
}

impl<S: FactStore + Send + Sync + 'static> FactReader<S> {
    /// Create a new reader.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetch a fact by id, applying the full visibility pipeline.
    ///
    /// Returns `FactNotFound` for absent, unreadable, out-of-window, and
    /// (unless requested) retracted facts alike.
    pub async fn get_fact(
        &self,
        context: &SecurityContext,
        id: FactId,
        params: TraversalParams,
    ) -> Result<FactRecord, ReadError> {
        let fact = self
            .store
            .get_fact(&id)
            .await
            .map_err(|e| ReadError::StoreError(e.to_string()))?
            .ok_or(ReadError::FactNotFound(id))?;

        let filter = VisibilityFilter::new(
            Arc::clone(&self.store),
            context.clone(),
            params,
            READER_MEMO_CAPACITY,
        );
        if !filter.visible(&fact).await? {
            return Err(ReadError::FactNotFound(id));
        }
        Ok(fact)
    }

    /// List the comments of a fact the subject can read, ordered by
    /// timestamp then id.
    pub async fn list_comments(
        &self,
        context: &SecurityContext,
        fact_id: FactId,
    ) -> Result<Vec<FactComment>, ReadError> {
        let fact = self
            .store
            .get_fact(&fact_id)
            .await
            .map_err(|e| ReadError::StoreError(e.to_string()))?
            .ok_or(ReadError::FactNotFound(fact_id))?;
        if !context.can_read_fact(&fact) {
            return Err(ReadError::FactNotFound(fact_id));
        }
        self.store
            .get_comments(&fact_id)
            .await
            .map_err(|e| ReadError::StoreError(e.to_string()))
    }
}
