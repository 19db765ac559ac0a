//! Per-request authorization oracle.
//!
//! A `SecurityContext` is constructed once per request from a [`Subject`]
//! snapshot and reused for the request's whole duration, traversal included.
//! Decisions are plain booleans: absence of permission is `false`, and the
//! caller decides whether that surfaces as an access-denied failure or as
//! not-found (when existence itself must be hidden, a forbidden fact must be
//! indistinguishable from a non-existent one).
//!
//! Decisions are never cached across requests: ACL entries are append-only
//! and roles can change between requests, so each request evaluates against
//! its own snapshot.

use uuid::Uuid;

use crate::store::FactStore;
use crate::types::{AccessMode, FactRecord, Grant, ObjectRecord, Subject};

/// Per-request authorization oracle.
///
/// Closed over an immutable subject snapshot, so it is safe to consult
/// concurrently from parallel edge expansions within one traversal.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    subject: Subject,
}

impl SecurityContext {
    /// Create a context for the given subject snapshot.
    pub fn new(subject: Subject) -> Self {
        Self { subject }
    }

    /// The subject this context decides for.
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// The subject's identifier.
    pub fn current_user_id(&self) -> Uuid {
        self.subject.id
    }

    /// The subject's own organization.
    pub fn current_organization_id(&self) -> Uuid {
        self.subject.organization_id
    }

    /// Whether the subject may read the given fact.
    ///
    /// - `Public`: always readable.
    /// - `RoleBased`: readable within the fact's organization, by an
    ///   administrator scoped to that organization, or through an ACL entry
    ///   widening access.
    /// - `Explicit`: readable only through the fact's ACL set.
    pub fn can_read_fact(&self, fact: &FactRecord) -> bool {
        match fact.access_mode {
            AccessMode::Public => true,
            AccessMode::RoleBased => {
                self.subject.organization_id == fact.organization_id
                    || self.subject.has_grant(fact.organization_id, Grant::Administer)
                    || fact.acl.contains(&self.subject.id)
            }
            AccessMode::Explicit => fact.acl.contains(&self.subject.id),
        }
    }

    /// Whether the subject may create facts for the given organization.
    pub fn can_write(&self, organization_id: Uuid) -> bool {
        self.subject.has_grant(organization_id, Grant::AddFacts)
    }

    /// Whether the subject may see the given object.
    ///
    /// Objects carry no access control of their own: an object is readable
    /// iff at least one fact bound to it is readable. An object with no
    /// visible facts does not exist as far as this subject is concerned.
    pub async fn can_read_object<S: FactStore>(
        &self,
        store: &S,
        object: &ObjectRecord,
    ) -> Result<bool, S::Error> {
        let facts = store.get_object_facts(&object.id).await?;
        Ok(facts.iter().any(|fact| self.can_read_fact(fact)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryFactStore;
    use crate::types::{FactId, ObjectId};

    fn make_fact(id: u128, organization_id: Uuid, access_mode: AccessMode) -> FactRecord {
        FactRecord::new(
            FactId::new(Uuid::from_u128(id)),
            Uuid::from_u128(10),
            organization_id,
            Uuid::from_u128(200),
            access_mode,
            1000,
        )
    }

    #[test]
    fn test_public_facts_readable_by_everyone() {
        let fact = make_fact(1, Uuid::from_u128(100), AccessMode::Public);
        let stranger = SecurityContext::new(Subject::new(
            Uuid::from_u128(1),
            "stranger",
            Uuid::from_u128(999),
        ));
        assert!(stranger.can_read_fact(&fact));
    }

    #[test]
    fn test_role_based_requires_same_organization_or_admin() {
        let org = Uuid::from_u128(100);
        let fact = make_fact(1, org, AccessMode::RoleBased);

        let insider = SecurityContext::new(Subject::new(Uuid::from_u128(1), "insider", org));
        let outsider =
            SecurityContext::new(Subject::new(Uuid::from_u128(2), "outsider", Uuid::from_u128(999)));
        let admin = SecurityContext::new(
            Subject::new(Uuid::from_u128(3), "admin", Uuid::from_u128(999))
                .with_grant(org, Grant::Administer),
        );

        assert!(insider.can_read_fact(&fact));
        assert!(!outsider.can_read_fact(&fact));
        assert!(admin.can_read_fact(&fact));
    }

    #[test]
    fn test_role_based_widened_by_acl_entry() {
        let org = Uuid::from_u128(100);
        let outsider_id = Uuid::from_u128(2);
        let fact = make_fact(1, org, AccessMode::RoleBased).with_acl([outsider_id]);

        let outsider =
            SecurityContext::new(Subject::new(outsider_id, "outsider", Uuid::from_u128(999)));
        assert!(outsider.can_read_fact(&fact));
    }

    #[test]
    fn test_explicit_requires_acl_membership() {
        let org = Uuid::from_u128(100);
        let member_id = Uuid::from_u128(1);
        let fact = make_fact(1, org, AccessMode::Explicit).with_acl([member_id]);

        let member = SecurityContext::new(Subject::new(member_id, "member", org));
        // Same organization is not enough for explicit facts.
        let insider = SecurityContext::new(Subject::new(Uuid::from_u128(2), "insider", org));

        assert!(member.can_read_fact(&fact));
        assert!(!insider.can_read_fact(&fact));
    }

    #[test]
    fn test_can_write_requires_add_facts_grant() {
        let org = Uuid::from_u128(100);
        let writer = SecurityContext::new(
            Subject::new(Uuid::from_u128(1), "writer", org).with_grant(org, Grant::AddFacts),
        );
        let reader = SecurityContext::new(Subject::new(Uuid::from_u128(2), "reader", org));

        assert!(writer.can_write(org));
        assert!(!reader.can_write(org));
        assert!(!writer.can_write(Uuid::from_u128(999)));
    }

    #[tokio::test]
    async fn test_object_visibility_derives_from_bound_facts() {
        let org = Uuid::from_u128(100);
        let object_id = ObjectId::new(Uuid::from_u128(50));
        let other_id = ObjectId::new(Uuid::from_u128(51));

        let store = InMemoryFactStore::new();
        store.add_object(ObjectRecord::new(object_id, Uuid::from_u128(5), "apt28"));
        store.add_object(ObjectRecord::new(other_id, Uuid::from_u128(5), "sofacy"));
        store.add_fact(
            make_fact(1, org, AccessMode::Explicit).with_endpoints(object_id, other_id),
        );

        let object = store.get_object(&object_id).await.unwrap().unwrap();
        let stranger = SecurityContext::new(Subject::new(
            Uuid::from_u128(9),
            "stranger",
            Uuid::from_u128(999),
        ));

        // Only an explicit fact binds the object and the stranger is not on
        // its ACL, so the object itself is invisible.
        assert!(!stranger.can_read_object(&store, &object).await.unwrap());
    }
}
