//! Graph traversal orchestration.
//!
//! The traverser resolves seed objects (hiding the existence of objects the
//! subject may not see), builds one visibility filter for the request,
//! drives the engine under a wall-clock budget, and finalizes the raw
//! result set deterministically.

pub mod engine;
pub mod filter;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use crate::policy::TraversalPolicy;
use crate::security::SecurityContext;
use crate::store::FactStore;
use crate::types::{FactId, FactRecord, ObjectId};

pub use engine::{AdjacencyEngine, EngineError, ExpandDirection, TraversalEngine};
pub use filter::{
    FilterError, FilterStats, TraversalParams, VisibilityFilter, VisibilityPredicate,
};

/// Error type for traversal operations.
#[derive(Debug, thiserror::Error)]
pub enum TraversalError {
    /// Seed object absent, or invisible to the subject (indistinguishable).
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),
    /// The engine run exceeded the wall-clock budget.
    #[error("traversal exceeded its time budget of {budget_ms} ms")]
    Timeout {
        /// The configured budget in milliseconds.
        budget_ms: u64,
    },
    /// The finalized result set exceeded the step budget.
    #[error("traversal exceeded its result budget of {max_results} facts")]
    ResultBudgetExceeded {
        /// The configured result cap.
        max_results: usize,
    },
    /// Engine error (includes filter failures during expansion).
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Store error while resolving seeds.
    #[error("Store error: {0}")]
    StoreError(String),
}

/// Traversal request parameters shared by the single- and multi-object
/// entry points.
#[derive(Debug, Clone)]
pub struct TraverseGraphRequest {
    /// Traversal expression in the engine's query language.
    pub query: String,
    /// Exclusive lower bound on observation time (epoch millis).
    pub after: Option<i64>,
    /// Exclusive upper bound on creation time (epoch millis).
    pub before: Option<i64>,
    /// Whether retracted facts appear in results.
    pub include_retracted: bool,
}

impl TraverseGraphRequest {
    /// Create a request with an unbounded window, excluding retracted facts.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            after: None,
            before: None,
            include_retracted: false,
        }
    }

    /// Set the exclusive lower bound on observation time.
    pub fn with_after(mut self, after: i64) -> Self {
        self.after = Some(after);
        self
    }

    /// Set the exclusive upper bound on creation time.
    pub fn with_before(mut self, before: i64) -> Self {
        self.before = Some(before);
        self
    }

    /// Include retracted facts in the results.
    pub fn with_include_retracted(mut self, include_retracted: bool) -> Self {
        self.include_retracted = include_retracted;
        self
    }

    fn params(&self) -> TraversalParams {
        TraversalParams {
            after: self.after,
            before: self.before,
            include_retracted: self.include_retracted,
        }
    }
}

/// Finalized traversal result: deduplicated, deterministically ordered.
#[derive(Debug, Clone, Default)]
pub struct TraversalResult {
    /// Reached facts, ordered by fact id.
    pub facts: Vec<FactRecord>,
}

impl TraversalResult {
    /// Ids of the reached facts.
    pub fn fact_ids(&self) -> Vec<FactId> {
        self.facts.iter().map(|fact| fact.id).collect()
    }

    /// Number of reached facts.
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether no facts were reached.
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// Runs traversal queries against the graph, filtered live.
pub struct GraphTraverser<S, E> {
    store: Arc<S>,
    engine: Arc<E>,
    policy: TraversalPolicy,
}

impl<S, E> GraphTraverser<S, E>
where
    S: FactStore + Send + Sync + 'static,
    E: TraversalEngine,
{
    /// Create a traverser with the default budget.
    pub fn new(store: Arc<S>, engine: Arc<E>) -> Self {
        Self {
            store,
            engine,
            policy: TraversalPolicy::default(),
        }
    }

    /// Replace the traversal budget.
    pub fn with_policy(mut self, policy: TraversalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Traverse from a single seed object.
    ///
    /// Delegates to the multi-object entry point.
    pub async fn traverse_object(
        &self,
        context: &SecurityContext,
        seed_id: ObjectId,
        request: &TraverseGraphRequest,
    ) -> Result<TraversalResult, TraversalError> {
        self.traverse_objects(context, &BTreeSet::from([seed_id]), request)
            .await
    }

    /// Traverse from a set of seed objects.
    pub async fn traverse_objects(
        &self,
        context: &SecurityContext,
        seed_ids: &BTreeSet<ObjectId>,
        request: &TraverseGraphRequest,
    ) -> Result<TraversalResult, TraversalError> {
        // Resolve seeds first. An object the subject may not see is
        // reported exactly like an absent one.
        let mut seeds = Vec::with_capacity(seed_ids.len());
        for seed_id in seed_ids {
            let object = self
                .store
                .get_object(seed_id)
                .await
                .map_err(|e| TraversalError::StoreError(e.to_string()))?
                .ok_or(TraversalError::ObjectNotFound(*seed_id))?;
            let readable = context
                .can_read_object(self.store.as_ref(), &object)
                .await
                .map_err(|e| TraversalError::StoreError(e.to_string()))?;
            if !readable {
                return Err(TraversalError::ObjectNotFound(*seed_id));
            }
            seeds.push(object.id);
        }

        // One filter per request: the security snapshot and retraction memo
        // stay consistent across the whole engine run.
        let filter = VisibilityFilter::new(
            Arc::clone(&self.store),
            context.clone(),
            request.params(),
            self.policy.retraction_cache_size,
        );

        let budget = Duration::from_millis(self.policy.timeout_ms);
        let raw = tokio::time::timeout(
            budget,
            self.engine.execute(&request.query, &seeds, &filter),
        )
        .await
        .map_err(|_| TraversalError::Timeout {
            budget_ms: self.policy.timeout_ms,
        })??;

        self.finalize(raw)
    }

    /// Deduplicate, enforce the step budget, and order deterministically.
    fn finalize(&self, raw: Vec<FactRecord>) -> Result<TraversalResult, TraversalError> {
        let deduplicated: BTreeMap<FactId, FactRecord> =
            raw.into_iter().map(|fact| (fact.id, fact)).collect();
        if deduplicated.len() > self.policy.max_results {
            return Err(TraversalError::ResultBudgetExceeded {
                max_results: self.policy.max_results,
            });
        }
        Ok(TraversalResult {
            facts: deduplicated.into_values().collect(),
        })
    }
}
