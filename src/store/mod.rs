//! Fact storage gateways.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{
    AclEntry, FactComment, FactId, FactRecord, MetaFactBinding, ObjectId, ObjectRecord,
    OriginRecord,
};

/// Trait for durable fact/object storage backends.
///
/// The gateway is the sole owner of durable state; the kernel components
/// hold no mutable state beyond per-request data. Implementations must
/// guarantee deterministic ordering of listing results and idempotent
/// binding saves (retraction retries the binding write with the same
/// identifiers). All methods are async to support async database access.
#[async_trait]
pub trait FactStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync;

    /// Fetch a fact by id.
    async fn get_fact(&self, id: &FactId) -> Result<Option<FactRecord>, Self::Error>;

    /// Persist a fact and return the stored record.
    async fn save_fact(&self, fact: FactRecord) -> Result<FactRecord, Self::Error>;

    /// Persist a meta-fact binding. Idempotent on the (fact, meta) pair.
    async fn save_meta_fact_binding(&self, binding: MetaFactBinding) -> Result<(), Self::Error>;

    /// Fetch the meta-fact bindings of a fact (ordered canonically).
    async fn get_meta_fact_bindings(
        &self,
        fact_id: &FactId,
    ) -> Result<Vec<MetaFactBinding>, Self::Error>;

    /// Append ACL entries for the given subjects and mirror them into the
    /// fact's ACL set. Returns the subjects actually added (already-present
    /// subjects are skipped; entries are append-only).
    async fn save_acl_entries(
        &self,
        fact_id: &FactId,
        subject_ids: &[Uuid],
        granted_by_origin_id: Uuid,
        timestamp: i64,
    ) -> Result<Vec<Uuid>, Self::Error>;

    /// List the ACL entries of a fact (ordered canonically).
    async fn get_acl_entries(&self, fact_id: &FactId) -> Result<Vec<AclEntry>, Self::Error>;

    /// Persist a comment on a fact.
    async fn save_comment(&self, comment: FactComment) -> Result<(), Self::Error>;

    /// List the comments of a fact (ordered by timestamp, then id).
    async fn get_comments(&self, fact_id: &FactId) -> Result<Vec<FactComment>, Self::Error>;

    /// Fetch an object by id.
    async fn get_object(&self, id: &ObjectId) -> Result<Option<ObjectRecord>, Self::Error>;

    /// Fetch the facts bound to an object as source or destination
    /// (ordered by fact id).
    async fn get_object_facts(&self, object_id: &ObjectId) -> Result<Vec<FactRecord>, Self::Error>;

    /// Fetch an origin by id.
    async fn get_origin(&self, id: &Uuid) -> Result<Option<OriginRecord>, Self::Error>;

    /// Persist an origin and return the stored record.
    async fn save_origin(&self, origin: OriginRecord) -> Result<OriginRecord, Self::Error>;
}

pub use memory::InMemoryFactStore;
