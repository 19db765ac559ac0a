//! Subject snapshots: who is asking, and what they are allowed to do.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// A function a subject may hold, scoped to an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grant {
    /// Create facts (including retractions) for the organization.
    AddFacts,
    /// Administer the organization; implies read access to its
    /// role-based facts.
    Administer,
}

/// Immutable per-request snapshot of the requesting subject.
///
/// Captured once when a request starts and reused for its whole duration,
/// so that concurrent ACL or role changes cannot produce an inconsistent
/// partial view within a single traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// The subject's own organization.
    pub organization_id: Uuid,
    /// Organization-scoped grants.
    grants: BTreeMap<Uuid, BTreeSet<Grant>>,
}

impl Subject {
    /// Create a new subject snapshot with no grants.
    pub fn new(id: Uuid, name: impl Into<String>, organization_id: Uuid) -> Self {
        Self {
            id,
            name: name.into(),
            organization_id,
            grants: BTreeMap::new(),
        }
    }

    /// Add a grant scoped to an organization.
    pub fn with_grant(mut self, organization_id: Uuid, grant: Grant) -> Self {
        self.grants.entry(organization_id).or_default().insert(grant);
        self
    }

    /// Whether the subject holds a grant for the given organization.
    pub fn has_grant(&self, organization_id: Uuid, grant: Grant) -> bool {
        self.grants
            .get(&organization_id)
            .map(|set| set.contains(&grant))
            .unwrap_or(false)
    }
}
