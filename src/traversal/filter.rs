//! Per-edge visibility pipeline.
//!
//! Every fact edge the traversal engine touches passes through one
//! predicate combining, in fixed order:
//!
//! 1. **Security** — the cheapest veto, never skipped even under engine
//!    optimizations.
//! 2. **Time bound** — the fact's observation interval must intersect the
//!    requested window.
//! 3. **Retraction** — unless retracted facts were requested, a fact with a
//!    retraction visible to the subject is excluded.
//!
//! The pipeline runs at edge-expansion time, not as a post-filter: the
//! engine must never see or route through a rejected fact, since
//! intermediate path state (e.g. shortest-path length) could otherwise leak
//! restricted existence.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;

use crate::security::SecurityContext;
use crate::store::FactStore;
use crate::types::{FactId, FactRecord};

/// Error type for filter evaluation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FilterError {
    /// Store error while resolving retraction status.
    #[error("Store error: {0}")]
    StoreError(String),
}

/// Time window and retraction toggle for one traversal request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraversalParams {
    /// Exclusive lower bound on observation time (epoch millis).
    pub after: Option<i64>,
    /// Exclusive upper bound on creation time (epoch millis).
    pub before: Option<i64>,
    /// Whether retracted facts appear in results.
    pub include_retracted: bool,
}

/// Visibility decision consumed by the traversal engine for every edge.
///
/// Implementations must be safe to call concurrently: the engine may
/// parallelize edge expansion within one traversal execution.
#[async_trait]
pub trait VisibilityPredicate: Send + Sync {
    /// Whether the fact may appear in results or be traversed through.
    async fn visible(&self, fact: &FactRecord) -> Result<bool, FilterError>;
}

/// Statistics for the per-request retraction memo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Retraction lookups answered from the memo.
    pub memo_hits: u64,
    /// Retraction lookups that went to the store.
    pub memo_misses: u64,
}

/// The three-stage visibility filter for one request.
///
/// Closed over an immutable security snapshot and request parameters; the
/// only interior state is the bounded retraction memo, which is sound
/// within a request because decisions are made against a single per-request
/// snapshot.
pub struct VisibilityFilter<S> {
    store: Arc<S>,
    context: SecurityContext,
    params: TraversalParams,
    retraction_memo: Mutex<LruCache<FactId, bool>>,
    stats: Mutex<FilterStats>,
}

impl<S: FactStore> VisibilityFilter<S> {
    /// Create a filter for one traversal request.
    pub fn new(
        store: Arc<S>,
        context: SecurityContext,
        params: TraversalParams,
        memo_capacity: usize,
    ) -> Self {
        let capacity =
            NonZeroUsize::new(memo_capacity).unwrap_or(NonZeroUsize::new(1024).unwrap());
        Self {
            store,
            context,
            params,
            retraction_memo: Mutex::new(LruCache::new(capacity)),
            stats: Mutex::new(FilterStats::default()),
        }
    }

    /// Memo statistics for this request.
    pub fn stats(&self) -> FilterStats {
        *self.stats.lock()
    }

    /// Whether the fact has a retraction visible to this subject.
    ///
    /// Only the security check applies to the retraction itself: a
    /// retraction outside the query's time window still suppresses its
    /// target.
    async fn is_retracted(&self, fact: &FactRecord) -> Result<bool, FilterError> {
        if let Some(retracted) = self.retraction_memo.lock().get(&fact.id).copied() {
            self.stats.lock().memo_hits += 1;
            return Ok(retracted);
        }
        self.stats.lock().memo_misses += 1;

        let bindings = self
            .store
            .get_meta_fact_bindings(&fact.id)
            .await
            .map_err(|e| FilterError::StoreError(e.to_string()))?;

        let mut retracted = false;
        for binding in bindings {
            let meta = self
                .store
                .get_fact(&binding.meta_fact_id)
                .await
                .map_err(|e| FilterError::StoreError(e.to_string()))?;
            if let Some(meta) = meta {
                if meta.is_retraction()
                    && meta.in_reference_to_id == Some(fact.id)
                    && self.context.can_read_fact(&meta)
                {
                    retracted = true;
                    break;
                }
            }
        }

        self.retraction_memo.lock().put(fact.id, retracted);
        Ok(retracted)
    }
}

#[async_trait]
impl<S: FactStore> VisibilityPredicate for VisibilityFilter<S> {
    async fn visible(&self, fact: &FactRecord) -> Result<bool, FilterError> {
        // 1. Security.
        if !self.context.can_read_fact(fact) {
            return Ok(false);
        }

        // 2. Time bound.
        if !fact.observed_within(self.params.after, self.params.before) {
            return Ok(false);
        }

        // 3. Retraction visibility.
        if !self.params.include_retracted && self.is_retracted(fact).await? {
            return Ok(false);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryFactStore;
    use crate::types::{
        retraction_fact_type_id, AccessMode, MetaFactBinding, Subject,
    };
    use uuid::Uuid;

    const ORG: u128 = 100;

    fn make_fact(id: u128, access_mode: AccessMode, timestamp: i64) -> FactRecord {
        FactRecord::new(
            FactId::new(Uuid::from_u128(id)),
            Uuid::from_u128(10),
            Uuid::from_u128(ORG),
            Uuid::from_u128(200),
            access_mode,
            timestamp,
        )
    }

    fn make_retraction(id: u128, target: FactId, access_mode: AccessMode) -> FactRecord {
        FactRecord::new(
            FactId::new(Uuid::from_u128(id)),
            retraction_fact_type_id(),
            Uuid::from_u128(ORG),
            Uuid::from_u128(200),
            access_mode,
            2000,
        )
        .with_in_reference_to(target)
    }

    fn insider_context() -> SecurityContext {
        SecurityContext::new(Subject::new(
            Uuid::from_u128(1),
            "insider",
            Uuid::from_u128(ORG),
        ))
    }

    fn filter(
        store: Arc<InMemoryFactStore>,
        context: SecurityContext,
        params: TraversalParams,
    ) -> VisibilityFilter<InMemoryFactStore> {
        VisibilityFilter::new(store, context, params, 128)
    }

    #[tokio::test]
    async fn test_security_veto_comes_first() {
        let store = Arc::new(InMemoryFactStore::new());
        let fact = make_fact(1, AccessMode::Explicit, 1000);
        store.add_fact(fact.clone());

        let filter = filter(store, insider_context(), TraversalParams::default());
        assert!(!filter.visible(&fact).await.unwrap());
    }

    #[tokio::test]
    async fn test_time_window_excludes_out_of_range_facts() {
        let store = Arc::new(InMemoryFactStore::new());
        let fact = make_fact(1, AccessMode::Public, 100);
        store.add_fact(fact.clone());

        let context = insider_context();

        let excluded_after = filter(
            store.clone(),
            context.clone(),
            TraversalParams {
                after: Some(110),
                ..Default::default()
            },
        );
        assert!(!excluded_after.visible(&fact).await.unwrap());

        let included = filter(
            store.clone(),
            context.clone(),
            TraversalParams {
                after: Some(90),
                before: Some(150),
                ..Default::default()
            },
        );
        assert!(included.visible(&fact).await.unwrap());

        let excluded_before = filter(
            store,
            context,
            TraversalParams {
                before: Some(90),
                ..Default::default()
            },
        );
        assert!(!excluded_before.visible(&fact).await.unwrap());
    }

    #[tokio::test]
    async fn test_visible_retraction_suppresses_fact() {
        let store = Arc::new(InMemoryFactStore::new());
        let fact = make_fact(1, AccessMode::Public, 1000);
        let retraction = make_retraction(2, fact.id, AccessMode::Public);
        store.add_fact(fact.clone());
        store.add_fact(retraction.clone());
        store
            .save_meta_fact_binding(MetaFactBinding::new(fact.id, retraction.id))
            .await
            .unwrap();

        let excluded = filter(store.clone(), insider_context(), TraversalParams::default());
        assert!(!excluded.visible(&fact).await.unwrap());

        let included = filter(
            store,
            insider_context(),
            TraversalParams {
                include_retracted: true,
                ..Default::default()
            },
        );
        assert!(included.visible(&fact).await.unwrap());
        // The retraction fact itself follows the same rules.
        assert!(included.visible(&retraction).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreadable_retraction_does_not_suppress() {
        let store = Arc::new(InMemoryFactStore::new());
        let fact = make_fact(1, AccessMode::Public, 1000);
        // Explicit retraction with an empty ACL: invisible to the subject.
        let retraction = make_retraction(2, fact.id, AccessMode::Explicit);
        store.add_fact(fact.clone());
        store.add_fact(retraction.clone());
        store
            .save_meta_fact_binding(MetaFactBinding::new(fact.id, retraction.id))
            .await
            .unwrap();

        let filter = filter(store, insider_context(), TraversalParams::default());
        // The subject cannot see the retraction, so the fact stays visible.
        assert!(filter.visible(&fact).await.unwrap());
    }

    #[tokio::test]
    async fn test_retraction_memo_is_hit_on_repeat() {
        let store = Arc::new(InMemoryFactStore::new());
        let fact = make_fact(1, AccessMode::Public, 1000);
        store.add_fact(fact.clone());

        let filter = filter(store, insider_context(), TraversalParams::default());
        assert!(filter.visible(&fact).await.unwrap());
        assert!(filter.visible(&fact).await.unwrap());

        let stats = filter.stats();
        assert_eq!(stats.memo_misses, 1);
        assert_eq!(stats.memo_hits, 1);
    }
}
