//! Domain events produced by the kernel.
//!
//! Events are tagged with an access mode so that downstream consumers never
//! receive a payload more exposed than the write that produced it. For a
//! retraction the tag is the retraction's own (more restrictive) mode: any
//! subject able to see the retraction could already see the retracted fact.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fact::{AccessMode, FactRecord};

/// A domain event emitted by kernel operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServiceEvent {
    /// A fact was retracted.
    FactRetracted {
        /// The newly created retraction fact.
        retraction_fact: FactRecord,
        /// The fact that was retracted.
        retracted_fact: FactRecord,
        /// Organization the retraction was written for.
        organization_id: Uuid,
        /// Access mode of the event payload (the retraction's mode).
        access_mode: AccessMode,
        /// When the event was produced.
        occurred_at: DateTime<Utc>,
    },
}

impl ServiceEvent {
    /// Build a `FactRetracted` event stamped with the current time.
    pub fn fact_retracted(retraction_fact: FactRecord, retracted_fact: FactRecord) -> Self {
        let organization_id = retraction_fact.organization_id;
        let access_mode = retraction_fact.access_mode;
        Self::FactRetracted {
            retraction_fact,
            retracted_fact,
            organization_id,
            access_mode,
            occurred_at: Utc::now(),
        }
    }

    /// Access mode governing who may consume this event.
    pub fn access_mode(&self) -> AccessMode {
        match self {
            Self::FactRetracted { access_mode, .. } => *access_mode,
        }
    }
}

/// Sink for domain events.
///
/// Delivery is in-process and fire-and-forget from the kernel's point of
/// view; durable fan-out belongs to the adapter behind this trait.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish an event.
    async fn publish(&self, event: ServiceEvent);
}

/// Event sink that drops all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn publish(&self, _event: ServiceEvent) {}
}

/// Event sink that records events for test assertions.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<ServiceEvent>>,
}

impl RecordingEventSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events published so far.
    pub fn events(&self) -> Vec<ServiceEvent> {
        self.events.lock().clone()
    }

    /// Number of events published so far.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no events were published.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(&self, event: ServiceEvent) {
        self.events.lock().push(event);
    }
}
