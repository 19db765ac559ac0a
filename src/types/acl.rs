//! Access-control entries for facts with explicit ACLs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fact::FactId;

/// A single ACL grant on a fact.
///
/// Present for facts with `AccessMode::Explicit`, or to widen access to a
/// `RoleBased` fact beyond its organization. Entries accumulate and are
/// never removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclEntry {
    /// Fact this entry grants access to.
    pub fact_id: FactId,
    /// Subject being granted read access.
    pub subject_id: Uuid,
    /// Origin that granted the access.
    pub granted_by_origin_id: Uuid,
    /// Grant time (epoch millis).
    pub timestamp: i64,
}

impl AclEntry {
    /// Create a new ACL entry.
    pub fn new(fact_id: FactId, subject_id: Uuid, granted_by_origin_id: Uuid, timestamp: i64) -> Self {
        Self {
            fact_id,
            subject_id,
            granted_by_origin_id,
            timestamp,
        }
    }
}

// Canonical ordering: fact, then subject, then grant time.
impl PartialOrd for AclEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AclEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.fact_id.cmp(&other.fact_id) {
            std::cmp::Ordering::Equal => match self.subject_id.cmp(&other.subject_id) {
                std::cmp::Ordering::Equal => self.timestamp.cmp(&other.timestamp),
                ord => ord,
            },
            ord => ord,
        }
    }
}
