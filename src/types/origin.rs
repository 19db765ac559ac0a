//! Origin types: who contributed a fact, and how much to trust it.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default trust for origins created on behalf of a user.
pub const DEFAULT_USER_TRUST: f32 = 0.8;

/// Kind of contributor behind an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OriginType {
    /// A human user.
    User,
    /// An automated tool or feed.
    Tool,
}

impl fmt::Display for OriginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// Identity of the contributor of a fact.
///
/// Carries the organization used to resolve a default organization for new
/// facts when none is requested, and a trust score in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginRecord {
    /// Unique origin identifier. For user origins this equals the user id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Organization this origin belongs to.
    pub organization_id: Uuid,
    /// Trust score [0, 1].
    pub trust: f32,
    /// Kind of contributor.
    pub origin_type: OriginType,
}

impl OriginRecord {
    /// Create a new origin record.
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        organization_id: Uuid,
        trust: f32,
        origin_type: OriginType,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            organization_id,
            trust: trust.clamp(0.0, 1.0),
            origin_type,
        }
    }

    /// Create an origin for a user, with the default user trust.
    ///
    /// Used when a subject contributes a fact without naming an origin: the
    /// subject's own identity becomes the origin.
    pub fn for_user(user_id: Uuid, name: impl Into<String>, organization_id: Uuid) -> Self {
        Self::new(user_id, name, organization_id, DEFAULT_USER_TRUST, OriginType::User)
    }
}
