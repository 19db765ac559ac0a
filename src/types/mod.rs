//! Core types for the fact graph kernel.

pub mod acl;
pub mod binding;
pub mod comment;
pub mod event;
pub mod fact;
pub mod object;
pub mod origin;
pub mod subject;

pub use acl::AclEntry;
pub use binding::MetaFactBinding;
pub use comment::FactComment;
pub use event::{EventSink, NoOpEventSink, RecordingEventSink, ServiceEvent};
pub use fact::{
    retraction_fact_type_id, AccessMode, FactId, FactRecord, RETRACTION_FACT_TYPE_NAME,
};
pub use object::{ObjectId, ObjectRecord};
pub use origin::{OriginRecord, OriginType, DEFAULT_USER_TRUST};
pub use subject::{Grant, Subject};
