//! In-memory fact store for testing.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::FactStore;
use crate::types::{
    AclEntry, FactComment, FactId, FactRecord, MetaFactBinding, ObjectId, ObjectRecord,
    OriginRecord,
};

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// Fact not found.
    #[error("Fact not found: {0}")]
    FactNotFound(FactId),
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<ObjectId, ObjectRecord>,
    facts: BTreeMap<FactId, FactRecord>,
    /// Fact -> meta facts annotating it.
    bindings: BTreeMap<FactId, BTreeSet<FactId>>,
    acl_entries: BTreeMap<FactId, Vec<AclEntry>>,
    comments: BTreeMap<FactId, Vec<FactComment>>,
    origins: BTreeMap<Uuid, OriginRecord>,
    /// Object -> facts touching it as source or destination.
    object_facts: BTreeMap<ObjectId, BTreeSet<FactId>>,
}

impl Inner {
    fn index_fact(&mut self, fact: &FactRecord) {
        if let Some(source) = fact.source_object_id {
            self.object_facts.entry(source).or_default().insert(fact.id);
        }
        if let Some(destination) = fact.destination_object_id {
            self.object_facts
                .entry(destination)
                .or_default()
                .insert(fact.id);
        }
    }
}

/// In-memory fact store for testing.
///
/// Uses BTreeMap/BTreeSet for deterministic iteration order. State lives
/// behind a `parking_lot::RwLock` so that the gateway's save methods take
/// `&self` like any other backend.
#[derive(Debug, Default)]
pub struct InMemoryFactStore {
    inner: RwLock<Inner>,
}

impl InMemoryFactStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the store (test setup).
    pub fn add_object(&self, object: ObjectRecord) {
        self.inner.write().objects.insert(object.id, object);
    }

    /// Add a fact to the store and index its endpoints (test setup).
    pub fn add_fact(&self, fact: FactRecord) {
        let mut inner = self.inner.write();
        inner.index_fact(&fact);
        inner.facts.insert(fact.id, fact);
    }

    /// Add an origin to the store (test setup).
    pub fn add_origin(&self, origin: OriginRecord) {
        self.inner.write().origins.insert(origin.id, origin);
    }

    /// Number of facts in the store.
    pub fn num_facts(&self) -> usize {
        self.inner.read().facts.len()
    }

    /// Number of meta-fact bindings in the store.
    pub fn num_bindings(&self) -> usize {
        self.inner.read().bindings.values().map(|set| set.len()).sum()
    }
}

#[async_trait]
impl FactStore for InMemoryFactStore {
    type Error = InMemoryError;

    async fn get_fact(&self, id: &FactId) -> Result<Option<FactRecord>, Self::Error> {
        Ok(self.inner.read().facts.get(id).cloned())
    }

    async fn save_fact(&self, fact: FactRecord) -> Result<FactRecord, Self::Error> {
        let mut inner = self.inner.write();
        inner.index_fact(&fact);
        inner.facts.insert(fact.id, fact.clone());
        Ok(fact)
    }

    async fn save_meta_fact_binding(&self, binding: MetaFactBinding) -> Result<(), Self::Error> {
        let mut inner = self.inner.write();
        if !inner.facts.contains_key(&binding.fact_id) {
            return Err(InMemoryError::FactNotFound(binding.fact_id));
        }
        if !inner.facts.contains_key(&binding.meta_fact_id) {
            return Err(InMemoryError::FactNotFound(binding.meta_fact_id));
        }
        inner
            .bindings
            .entry(binding.fact_id)
            .or_default()
            .insert(binding.meta_fact_id);
        Ok(())
    }

    async fn get_meta_fact_bindings(
        &self,
        fact_id: &FactId,
    ) -> Result<Vec<MetaFactBinding>, Self::Error> {
        Ok(self
            .inner
            .read()
            .bindings
            .get(fact_id)
            .map(|metas| {
                metas
                    .iter()
                    .map(|meta| MetaFactBinding::new(*fact_id, *meta))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn save_acl_entries(
        &self,
        fact_id: &FactId,
        subject_ids: &[Uuid],
        granted_by_origin_id: Uuid,
        timestamp: i64,
    ) -> Result<Vec<Uuid>, Self::Error> {
        let mut inner = self.inner.write();
        let fact = inner
            .facts
            .get_mut(fact_id)
            .ok_or(InMemoryError::FactNotFound(*fact_id))?;

        let mut applied = Vec::new();
        let mut entries = Vec::new();
        for subject_id in subject_ids {
            // Append-only: an already-granted subject is skipped, not duplicated.
            if fact.acl.insert(*subject_id) {
                applied.push(*subject_id);
                entries.push(AclEntry::new(
                    *fact_id,
                    *subject_id,
                    granted_by_origin_id,
                    timestamp,
                ));
            }
        }
        inner.acl_entries.entry(*fact_id).or_default().extend(entries);
        applied.sort();
        Ok(applied)
    }

    async fn get_acl_entries(&self, fact_id: &FactId) -> Result<Vec<AclEntry>, Self::Error> {
        let mut entries = self
            .inner
            .read()
            .acl_entries
            .get(fact_id)
            .cloned()
            .unwrap_or_default();
        entries.sort();
        Ok(entries)
    }

    async fn save_comment(&self, comment: FactComment) -> Result<(), Self::Error> {
        let mut inner = self.inner.write();
        if !inner.facts.contains_key(&comment.fact_id) {
            return Err(InMemoryError::FactNotFound(comment.fact_id));
        }
        inner
            .comments
            .entry(comment.fact_id)
            .or_default()
            .push(comment);
        Ok(())
    }

    async fn get_comments(&self, fact_id: &FactId) -> Result<Vec<FactComment>, Self::Error> {
        let mut comments = self
            .inner
            .read()
            .comments
            .get(fact_id)
            .cloned()
            .unwrap_or_default();
        comments.sort();
        Ok(comments)
    }

    async fn get_object(&self, id: &ObjectId) -> Result<Option<ObjectRecord>, Self::Error> {
        Ok(self.inner.read().objects.get(id).cloned())
    }

    async fn get_object_facts(&self, object_id: &ObjectId) -> Result<Vec<FactRecord>, Self::Error> {
        let inner = self.inner.read();
        Ok(inner
            .object_facts
            .get(object_id)
            .map(|fact_ids| {
                fact_ids
                    .iter()
                    .filter_map(|id| inner.facts.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_origin(&self, id: &Uuid) -> Result<Option<OriginRecord>, Self::Error> {
        Ok(self.inner.read().origins.get(id).cloned())
    }

    async fn save_origin(&self, origin: OriginRecord) -> Result<OriginRecord, Self::Error> {
        self.inner.write().origins.insert(origin.id, origin.clone());
        Ok(origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccessMode;

    fn make_fact(id: u128) -> FactRecord {
        FactRecord::new(
            FactId::new(Uuid::from_u128(id)),
            Uuid::from_u128(10),
            Uuid::from_u128(100),
            Uuid::from_u128(200),
            AccessMode::Public,
            1000,
        )
    }

    #[tokio::test]
    async fn test_save_and_get_fact() {
        let store = InMemoryFactStore::new();
        let fact = make_fact(1);
        let id = fact.id;

        store.save_fact(fact).await.unwrap();

        let retrieved = store.get_fact(&id).await.unwrap();
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_object_fact_index_covers_both_endpoints() {
        let store = InMemoryFactStore::new();
        let source = ObjectId::new(Uuid::from_u128(11));
        let destination = ObjectId::new(Uuid::from_u128(12));
        store.add_object(ObjectRecord::new(source, Uuid::from_u128(5), "a"));
        store.add_object(ObjectRecord::new(destination, Uuid::from_u128(5), "b"));

        let fact = make_fact(1).with_endpoints(source, destination);
        store.save_fact(fact).await.unwrap();

        let from_source = store.get_object_facts(&source).await.unwrap();
        let from_destination = store.get_object_facts(&destination).await.unwrap();
        assert_eq!(from_source.len(), 1);
        assert_eq!(from_destination.len(), 1);
    }

    #[tokio::test]
    async fn test_binding_save_is_idempotent() {
        let store = InMemoryFactStore::new();
        let fact = make_fact(1);
        let meta = make_fact(2);
        let binding = MetaFactBinding::new(fact.id, meta.id);
        store.save_fact(fact).await.unwrap();
        store.save_fact(meta).await.unwrap();

        store.save_meta_fact_binding(binding).await.unwrap();
        store.save_meta_fact_binding(binding).await.unwrap();

        assert_eq!(store.num_bindings(), 1);
    }

    #[tokio::test]
    async fn test_binding_requires_both_facts() {
        let store = InMemoryFactStore::new();
        let fact = make_fact(1);
        let missing = FactId::new(Uuid::from_u128(99));
        store.save_fact(fact.clone()).await.unwrap();

        let result = store
            .save_meta_fact_binding(MetaFactBinding::new(fact.id, missing))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_acl_entries_accumulate_without_duplicates() {
        let store = InMemoryFactStore::new();
        let fact = make_fact(1);
        let fact_id = fact.id;
        store.save_fact(fact).await.unwrap();

        let alice = Uuid::from_u128(1);
        let bob = Uuid::from_u128(2);
        let granter = Uuid::from_u128(9);

        let applied = store
            .save_acl_entries(&fact_id, &[alice, bob], granter, 1000)
            .await
            .unwrap();
        assert_eq!(applied, vec![alice, bob]);

        // Re-granting alice is a no-op; only the new subject is applied.
        let carol = Uuid::from_u128(3);
        let applied = store
            .save_acl_entries(&fact_id, &[alice, carol], granter, 2000)
            .await
            .unwrap();
        assert_eq!(applied, vec![carol]);

        let entries = store.get_acl_entries(&fact_id).await.unwrap();
        assert_eq!(entries.len(), 3);

        let fact = store.get_fact(&fact_id).await.unwrap().unwrap();
        assert!(fact.acl.contains(&alice) && fact.acl.contains(&bob) && fact.acl.contains(&carol));
    }

    #[tokio::test]
    async fn test_comments_ordered_by_timestamp() {
        let store = InMemoryFactStore::new();
        let fact = make_fact(1);
        let fact_id = fact.id;
        store.save_fact(fact).await.unwrap();

        let origin = Uuid::from_u128(9);
        store
            .save_comment(FactComment::new(Uuid::from_u128(2), fact_id, origin, "later", 2000))
            .await
            .unwrap();
        store
            .save_comment(FactComment::new(Uuid::from_u128(1), fact_id, origin, "earlier", 1000))
            .await
            .unwrap();

        let comments = store.get_comments(&fact_id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment, "earlier");
        assert_eq!(comments[1].comment, "later");
    }
}
