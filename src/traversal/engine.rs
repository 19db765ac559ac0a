//! Traversal engine interface and reference implementation.
//!
//! The production engine is an external collaborator executing an
//! externally defined query language. The kernel only supplies seeds and
//! the visibility predicate; the engine must consult the predicate for
//! every fact edge before emitting it or routing through it, and must be
//! restartable per request (no server-side cursor state).

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;

use super::filter::{FilterError, VisibilityPredicate};
use crate::store::FactStore;
use crate::types::{FactRecord, ObjectId};

/// Error type for engine execution.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The visibility predicate failed.
    #[error(transparent)]
    Filter(#[from] FilterError),
    /// Store error during expansion.
    #[error("Store error: {0}")]
    StoreError(String),
    /// The engine rejected the query expression.
    #[error("Query error: {0}")]
    Query(String),
}

/// Trait for graph traversal engines.
#[async_trait]
pub trait TraversalEngine: Send + Sync {
    /// Execute a traversal query from the given seed objects.
    ///
    /// Every fact edge encountered must pass `filter.visible` before it
    /// appears in the result or is expanded further.
    async fn execute(
        &self,
        query: &str,
        seeds: &[ObjectId],
        filter: &dyn VisibilityPredicate,
    ) -> Result<Vec<FactRecord>, EngineError>;
}

/// Direction of edge expansion for the reference engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandDirection {
    /// Follow facts whose source is the current object.
    Out,
    /// Follow facts touching the current object on either endpoint.
    Both,
}

/// Reference engine: bounded breadth-first expansion over fact edges.
///
/// Covers the out-edge neighborhood query shape used by the test suite;
/// parsing a full query language belongs to the production adapter, so the
/// query string is carried through untouched. Rejected edges are neither
/// emitted nor routed through.
pub struct AdjacencyEngine<S> {
    store: Arc<S>,
    direction: ExpandDirection,
    max_depth: usize,
}

impl<S: FactStore> AdjacencyEngine<S> {
    /// Create an engine expanding out-edges one hop from the seeds.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            direction: ExpandDirection::Out,
            max_depth: 1,
        }
    }

    /// Set the expansion direction.
    pub fn with_direction(mut self, direction: ExpandDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the maximum expansion depth in hops.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn expands(&self, fact: &FactRecord, from: &ObjectId) -> bool {
        match self.direction {
            ExpandDirection::Out => fact.source_object_id.as_ref() == Some(from),
            ExpandDirection::Both => fact.binds_object(from),
        }
    }
}

#[async_trait]
impl<S: FactStore> TraversalEngine for AdjacencyEngine<S> {
    async fn execute(
        &self,
        _query: &str,
        seeds: &[ObjectId],
        filter: &dyn VisibilityPredicate,
    ) -> Result<Vec<FactRecord>, EngineError> {
        let mut visited: BTreeSet<ObjectId> = seeds.iter().copied().collect();
        let mut seen_facts: BTreeSet<_> = BTreeSet::new();
        let mut frontier: VecDeque<(ObjectId, usize)> =
            seeds.iter().map(|seed| (*seed, 0)).collect();
        let mut results = Vec::new();

        while let Some((object_id, depth)) = frontier.pop_front() {
            if depth >= self.max_depth {
                continue;
            }
            let facts = self
                .store
                .get_object_facts(&object_id)
                .await
                .map_err(|e| EngineError::StoreError(e.to_string()))?;

            for fact in facts {
                if !self.expands(&fact, &object_id) || !seen_facts.insert(fact.id) {
                    continue;
                }
                // Visibility is decided at expansion time; a rejected edge
                // is invisible to the rest of the traversal.
                if !filter.visible(&fact).await? {
                    continue;
                }

                for endpoint in [fact.source_object_id, fact.destination_object_id]
                    .into_iter()
                    .flatten()
                {
                    if endpoint != object_id && visited.insert(endpoint) {
                        frontier.push_back((endpoint, depth + 1));
                    }
                }
                results.push(fact);
            }
        }

        Ok(results)
    }
}
