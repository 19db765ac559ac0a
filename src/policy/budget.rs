//! Traversal budgets and per-request tuning.

use serde::{Deserialize, Serialize};

/// Budget and tuning for a traversal execution.
///
/// ## Parameters
///
/// - `timeout_ms`: wall-clock budget for the engine run; exceeding it fails
///   the traversal instead of returning partial results
/// - `max_results`: step budget on the finalized result set
/// - `retraction_cache_size`: bound on the per-request retraction memo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalPolicy {
    /// Wall-clock budget in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of facts in the finalized result set.
    pub max_results: usize,
    /// Maximum entries in the per-request retraction memo.
    pub retraction_cache_size: usize,
}

impl Default for TraversalPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_results: 10_000,
            retraction_cache_size: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget_is_bounded() {
        let policy = TraversalPolicy::default();
        assert!(policy.timeout_ms > 0);
        assert!(policy.max_results > 0);
        assert!(policy.retraction_cache_size > 0);
    }
}
