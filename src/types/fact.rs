//! Fact types for the fact graph.
//!
//! A fact is a typed graph edge (or a free-standing annotation on another
//! fact) carrying access control, origin, and bitemporal metadata. Facts are
//! append-only: retraction adds a new fact plus a meta binding, it never
//! mutates or deletes the original.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use super::object::ObjectId;

/// Well-known name of the retraction fact type.
pub const RETRACTION_FACT_TYPE_NAME: &str = "Retraction";

/// Well-known type id for retraction facts.
///
/// Derived from the type name so that the retraction manager and the
/// traversal filter classify retractions identically without consulting a
/// type registry (the registry is an external collaborator).
pub fn retraction_fact_type_id() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, RETRACTION_FACT_TYPE_NAME.as_bytes())
}

/// Unique identifier for a fact (graph edge).
///
/// Wraps a UUID and implements `Ord` for deterministic ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactId(Uuid);

impl FactId {
    /// Create a new FactId from a UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a new FactId from a UUID string.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Generate a fresh random FactId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for FactId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Access mode of a fact, ordered by restrictiveness.
///
/// `Public < RoleBased < Explicit`. A derived fact may never be created with
/// an access mode less restrictive than the fact it derives from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccessMode {
    /// Readable by every subject.
    Public,
    /// Readable within the fact's organization (or by scoped administrators).
    RoleBased,
    /// Readable only by subjects in the fact's ACL set.
    Explicit,
}

impl AccessMode {
    /// Parse access mode from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "public" => Some(Self::Public),
            "rolebased" | "role_based" => Some(Self::RoleBased),
            "explicit" => Some(Self::Explicit),
            _ => None,
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::RoleBased => write!(f, "rolebased"),
            Self::Explicit => write!(f, "explicit"),
        }
    }
}

/// A fact edge (or fact about a fact) in the graph.
///
/// Endpoints are absent for meta facts such as retractions, which point at
/// their target through `in_reference_to_id` instead. Timestamps are epoch
/// milliseconds; `last_seen_timestamp` is monotonically non-decreasing and
/// never below `timestamp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactRecord {
    /// Unique fact identifier.
    pub id: FactId,
    /// Fact type identifier.
    pub type_id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Contributing origin.
    pub origin_id: Uuid,
    /// Who may read this fact.
    pub access_mode: AccessMode,
    /// Creation time (epoch millis).
    pub timestamp: i64,
    /// Last observation time (epoch millis), >= `timestamp`.
    pub last_seen_timestamp: i64,
    /// Link to another fact (retractions, meta facts).
    pub in_reference_to_id: Option<FactId>,
    /// Source object (edge tail); absent for facts about facts.
    pub source_object_id: Option<ObjectId>,
    /// Destination object (edge head); absent for facts about facts.
    pub destination_object_id: Option<ObjectId>,
    /// Explicit ACL subject set (bindings).
    pub acl: BTreeSet<Uuid>,
}

impl FactRecord {
    /// Create a new fact record with `last_seen_timestamp == timestamp`.
    pub fn new(
        id: FactId,
        type_id: Uuid,
        organization_id: Uuid,
        origin_id: Uuid,
        access_mode: AccessMode,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            type_id,
            organization_id,
            origin_id,
            access_mode,
            timestamp,
            last_seen_timestamp: timestamp,
            in_reference_to_id: None,
            source_object_id: None,
            destination_object_id: None,
            acl: BTreeSet::new(),
        }
    }

    /// Set the edge endpoints.
    pub fn with_endpoints(mut self, source: ObjectId, destination: ObjectId) -> Self {
        self.source_object_id = Some(source);
        self.destination_object_id = Some(destination);
        self
    }

    /// Set the back-reference to another fact.
    pub fn with_in_reference_to(mut self, fact_id: FactId) -> Self {
        self.in_reference_to_id = Some(fact_id);
        self
    }

    /// Set the explicit ACL subject set.
    pub fn with_acl(mut self, subjects: impl IntoIterator<Item = Uuid>) -> Self {
        self.acl = subjects.into_iter().collect();
        self
    }

    /// Record a re-observation of this fact.
    ///
    /// `last_seen_timestamp` only moves forward; observing with an earlier
    /// timestamp is a no-op.
    pub fn observe(&mut self, at: i64) {
        if at > self.last_seen_timestamp {
            self.last_seen_timestamp = at;
        }
    }

    /// Whether this fact is a retraction of another fact.
    pub fn is_retraction(&self) -> bool {
        self.type_id == retraction_fact_type_id() && self.in_reference_to_id.is_some()
    }

    /// Whether this fact touches the given object as source or destination.
    pub fn binds_object(&self, object_id: &ObjectId) -> bool {
        self.source_object_id.as_ref() == Some(object_id)
            || self.destination_object_id.as_ref() == Some(object_id)
    }

    /// Whether the fact was observed within the half-open window
    /// `(after, before)`.
    ///
    /// The fact's observation interval is `[timestamp, last_seen_timestamp]`;
    /// it is visible iff that interval intersects the window, i.e. it was
    /// seen after `after` (exclusive) and created before `before`
    /// (exclusive). Unset bounds are unbounded.
    pub fn observed_within(&self, after: Option<i64>, before: Option<i64>) -> bool {
        let seen_after = after.map_or(true, |a| self.last_seen_timestamp > a);
        let created_before = before.map_or(true, |b| self.timestamp < b);
        seen_after && created_before
    }
}

// Facts compare by id for deterministic ordering of result sets.
impl PartialEq for FactRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FactRecord {}

impl PartialOrd for FactRecord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FactRecord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}
