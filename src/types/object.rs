//! Object types for the fact graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an object (graph vertex).
///
/// Wraps a UUID and implements `Ord` for deterministic ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Create a new ObjectId from a UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a new ObjectId from a UUID string.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Generate a new random ObjectId (for testing).
    #[cfg(test)]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ObjectId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A typed graph vertex with a value.
///
/// Objects are immutable once created and carry no access control of their
/// own; visibility is derived transitively from the facts touching them.
/// The pair `(type_id, value)` identifies an object alongside its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Unique object identifier.
    pub id: ObjectId,
    /// Object type identifier.
    pub type_id: Uuid,
    /// Object value (e.g. an indicator, a name).
    pub value: String,
}

impl ObjectRecord {
    /// Create a new object record.
    pub fn new(id: ObjectId, type_id: Uuid, value: impl Into<String>) -> Self {
        Self {
            id,
            type_id,
            value: value.into(),
        }
    }
}

// Objects compare by id for deterministic ordering.
impl PartialEq for ObjectRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ObjectRecord {}

impl PartialOrd for ObjectRecord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ObjectRecord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}
