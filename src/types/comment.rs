//! Comments attached to facts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fact::FactId;

/// A comment attached to exactly one fact.
///
/// Comments order by timestamp, then id for stability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactComment {
    /// Unique comment identifier.
    pub id: Uuid,
    /// Fact this comment is attached to.
    pub fact_id: FactId,
    /// Comment this one replies to, if any.
    pub reply_to_id: Option<Uuid>,
    /// Origin that wrote the comment.
    pub origin_id: Uuid,
    /// Comment text.
    pub comment: String,
    /// Creation time (epoch millis).
    pub timestamp: i64,
}

impl FactComment {
    /// Create a new comment.
    pub fn new(
        id: Uuid,
        fact_id: FactId,
        origin_id: Uuid,
        comment: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            fact_id,
            reply_to_id: None,
            origin_id,
            comment: comment.into(),
            timestamp,
        }
    }

    /// Mark this comment as a reply to another comment.
    pub fn with_reply_to(mut self, comment_id: Uuid) -> Self {
        self.reply_to_id = Some(comment_id);
        self
    }
}

impl PartialOrd for FactComment {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FactComment {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.timestamp.cmp(&other.timestamp) {
            std::cmp::Ordering::Equal => self.id.cmp(&other.id),
            ord => ord,
        }
    }
}
