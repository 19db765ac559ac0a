//! Meta-fact bindings: annotation links between facts.

use serde::{Deserialize, Serialize};

use super::fact::FactId;

/// An annotation link attaching a meta fact to a fact.
///
/// `meta_fact_id` is itself a fact (a retraction, a comment-bearing fact)
/// annotating `fact_id`. Bindings are index pairs, never owning pointers,
/// so a meta fact can itself be retracted without ownership cycles.
/// Implements `Ord` for deterministic ordering: (fact, meta fact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetaFactBinding {
    /// The annotated fact.
    pub fact_id: FactId,
    /// The annotating meta fact.
    pub meta_fact_id: FactId,
}

impl MetaFactBinding {
    /// Create a new binding.
    pub fn new(fact_id: FactId, meta_fact_id: FactId) -> Self {
        Self {
            fact_id,
            meta_fact_id,
        }
    }
}

// Canonical ordering: fact, then meta fact.
impl PartialOrd for MetaFactBinding {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetaFactBinding {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.fact_id.cmp(&other.fact_id) {
            std::cmp::Ordering::Equal => self.meta_fact_id.cmp(&other.meta_fact_id),
            ord => ord,
        }
    }
}
