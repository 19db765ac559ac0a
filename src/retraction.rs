//! Retraction protocol.
//!
//! Retraction is additive: a new fact of the well-known retraction type is
//! created with a back-reference to the retracted fact, then linked to it
//! through a meta-fact binding. The retracted fact is never mutated in
//! storage; only its externally indexed "is-retracted" projection changes.
//!
//! ## Ordering guarantees
//!
//! Authorization and policy checks run before any write. Once the
//! retraction fact is persisted, the binding write is retried with the same
//! identifiers rather than compensated by deletion (the graph only grows).
//! The index projection is best-effort and decoupled: its failure is logged
//! and retried but never rolls back the retraction or surfaces to the
//! caller.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::index::SearchIndex;
use crate::policy::{resolve_access_mode, PolicyError};
use crate::security::SecurityContext;
use crate::store::FactStore;
use crate::types::{
    retraction_fact_type_id, AccessMode, EventSink, FactComment, FactId, FactRecord,
    MetaFactBinding, OriginRecord, ServiceEvent,
};

/// Attempts for the binding write after the retraction fact is persisted.
const BINDING_RETRY_ATTEMPTS: usize = 3;

/// Attempts for each best-effort index projection call.
const PROJECTION_RETRY_ATTEMPTS: usize = 3;

/// Error type for retraction operations.
#[derive(Debug, thiserror::Error)]
pub enum RetractionError {
    /// The fact to retract does not exist.
    #[error("Fact not found: {0}")]
    FactNotFound(FactId),
    /// The subject may not read the fact or write for the organization.
    #[error("access denied")]
    AccessDenied,
    /// The requested origin does not exist.
    #[error("Origin not found: {0}")]
    OriginNotFound(Uuid),
    /// The requested access mode would widen the retracted fact's access.
    #[error(transparent)]
    InvalidPolicy(#[from] PolicyError),
    /// Store error.
    #[error("Store error: {0}")]
    StoreError(String),
}

impl RetractionError {
    fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::StoreError(e.to_string())
    }
}

/// Request to retract a fact.
///
/// All fields except the target are optional; absent fields fall back to
/// the retracted fact (access mode), the origin (organization), or the
/// requesting subject (origin).
#[derive(Debug, Clone)]
pub struct RetractFactRequest {
    /// Fact to retract.
    pub fact_id: FactId,
    /// Organization to write the retraction for.
    pub organization_id: Option<Uuid>,
    /// Requested access mode of the retraction.
    pub access_mode: Option<AccessMode>,
    /// Origin contributing the retraction.
    pub origin_id: Option<Uuid>,
    /// Subjects to grant explicit access to the retraction.
    pub acl: Vec<Uuid>,
    /// Optional comment on the retraction.
    pub comment: Option<String>,
}

impl RetractFactRequest {
    /// Create a request with all optional fields unset.
    pub fn new(fact_id: FactId) -> Self {
        Self {
            fact_id,
            organization_id: None,
            access_mode: None,
            origin_id: None,
            acl: Vec::new(),
            comment: None,
        }
    }

    /// Request a specific organization.
    pub fn with_organization(mut self, organization_id: Uuid) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    /// Request a specific access mode.
    pub fn with_access_mode(mut self, access_mode: AccessMode) -> Self {
        self.access_mode = Some(access_mode);
        self
    }

    /// Request a specific origin.
    pub fn with_origin(mut self, origin_id: Uuid) -> Self {
        self.origin_id = Some(origin_id);
        self
    }

    /// Grant explicit access to the given subjects.
    pub fn with_acl(mut self, subjects: impl IntoIterator<Item = Uuid>) -> Self {
        self.acl = subjects.into_iter().collect();
        self
    }

    /// Attach a comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Creates retraction facts bound to their targets.
pub struct RetractionManager<S> {
    store: Arc<S>,
    index: Arc<dyn SearchIndex>,
    events: Arc<dyn EventSink>,
}

impl<S: FactStore + Send + Sync + 'static> RetractionManager<S> {
    /// Create a new retraction manager.
    pub fn new(store: Arc<S>, index: Arc<dyn SearchIndex>, events: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            index,
            events,
        }
    }

    /// Retract a fact on behalf of the context's subject.
    ///
    /// Returns the newly created retraction fact. Multiple retractions of
    /// the same fact accumulate as multiple meta bindings; they are not an
    /// error.
    pub async fn retract(
        &self,
        context: &SecurityContext,
        request: RetractFactRequest,
    ) -> Result<FactRecord, RetractionError> {
        // Fetch the fact to retract and verify that it exists.
        let fact_to_retract = self
            .store
            .get_fact(&request.fact_id)
            .await
            .map_err(RetractionError::from_store)?
            .ok_or(RetractionError::FactNotFound(request.fact_id))?;

        // A subject cannot retract a fact it cannot see.
        if !context.can_read_fact(&fact_to_retract) {
            return Err(RetractionError::AccessDenied);
        }

        let origin = self.resolve_origin(context, request.origin_id).await?;
        let organization_id = request
            .organization_id
            .unwrap_or(origin.organization_id);

        // Verify that the subject may add facts for the resolved organization.
        if !context.can_write(organization_id) {
            return Err(RetractionError::AccessDenied);
        }

        // The retraction is never more visible than the fact it retracts, so
        // any subject who can see the retraction could already see the
        // original.
        let access_mode = resolve_access_mode(
            request.access_mode,
            Some(fact_to_retract.access_mode),
        )?
        .unwrap_or(fact_to_retract.access_mode);

        let now = Utc::now().timestamp_millis();
        let mut retraction_fact = FactRecord::new(
            FactId::generate(),
            retraction_fact_type_id(),
            organization_id,
            origin.id,
            access_mode,
            now,
        )
        .with_in_reference_to(fact_to_retract.id);

        retraction_fact = self
            .store
            .save_fact(retraction_fact)
            .await
            .map_err(RetractionError::from_store)?;

        // Save the retraction as a meta fact of the retracted fact.
        self.save_binding_with_retry(MetaFactBinding::new(
            fact_to_retract.id,
            retraction_fact.id,
        ))
        .await?;

        let acl_subjects =
            initial_acl_subjects(access_mode, &request.acl, context.current_user_id());
        let mut applied_acl = Vec::new();
        if !acl_subjects.is_empty() {
            applied_acl = self
                .store
                .save_acl_entries(&retraction_fact.id, &acl_subjects, origin.id, now)
                .await
                .map_err(RetractionError::from_store)?;
            retraction_fact.acl.extend(applied_acl.iter().copied());
        }

        if let Some(text) = &request.comment {
            let comment =
                FactComment::new(Uuid::new_v4(), retraction_fact.id, origin.id, text, now);
            self.store
                .save_comment(comment)
                .await
                .map_err(RetractionError::from_store)?;
        }

        // The event carries both facts tagged with the retraction's (more
        // restrictive) access mode.
        self.events
            .publish(ServiceEvent::fact_retracted(
                retraction_fact.clone(),
                fact_to_retract.clone(),
            ))
            .await;

        // Best-effort index projection; never rolls back or surfaces.
        self.project_to_index(&retraction_fact, &applied_acl, &fact_to_retract.id)
            .await;

        Ok(retraction_fact)
    }

    /// Resolve the contributing origin.
    ///
    /// A requested origin must exist. Without one, the subject's own origin
    /// is used, created on demand as a user origin in the subject's
    /// organization.
    async fn resolve_origin(
        &self,
        context: &SecurityContext,
        origin_id: Option<Uuid>,
    ) -> Result<OriginRecord, RetractionError> {
        match origin_id {
            Some(id) => self
                .store
                .get_origin(&id)
                .await
                .map_err(RetractionError::from_store)?
                .ok_or(RetractionError::OriginNotFound(id)),
            None => {
                let user_id = context.current_user_id();
                if let Some(origin) = self
                    .store
                    .get_origin(&user_id)
                    .await
                    .map_err(RetractionError::from_store)?
                {
                    return Ok(origin);
                }
                let origin = OriginRecord::for_user(
                    user_id,
                    context.subject().name.clone(),
                    context.current_organization_id(),
                );
                self.store
                    .save_origin(origin)
                    .await
                    .map_err(RetractionError::from_store)
            }
        }
    }

    /// Persist the meta-fact binding, retrying with the same identifiers.
    ///
    /// The retraction fact is already durable at this point; a lost binding
    /// would orphan it silently, so the write is retried rather than
    /// compensated by deletion.
    async fn save_binding_with_retry(
        &self,
        binding: MetaFactBinding,
    ) -> Result<(), RetractionError> {
        let mut last_error = None;
        for attempt in 1..=BINDING_RETRY_ATTEMPTS {
            match self.store.save_meta_fact_binding(binding).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        fact_id = %binding.fact_id,
                        meta_fact_id = %binding.meta_fact_id,
                        attempt,
                        error = %e,
                        "meta-fact binding write failed"
                    );
                    last_error = Some(RetractionError::from_store(e));
                }
            }
        }
        Err(last_error.expect("at least one attempt"))
    }

    /// Push the retraction into the search index, best-effort.
    async fn project_to_index(
        &self,
        retraction_fact: &FactRecord,
        applied_acl: &[Uuid],
        retracted_id: &FactId,
    ) {
        let indexed = retry_projection(PROJECTION_RETRY_ATTEMPTS, || {
            self.index.index_fact(retraction_fact, applied_acl)
        })
        .await;
        if !indexed {
            tracing::error!(
                fact_id = %retraction_fact.id,
                "giving up on indexing retraction fact"
            );
        }

        let projected = retry_projection(PROJECTION_RETRY_ATTEMPTS, || {
            self.index.set_retracted(retracted_id, true)
        })
        .await;
        if !projected {
            tracing::error!(
                fact_id = %retracted_id,
                "giving up on retracted projection update"
            );
        }
    }
}

/// Initial ACL for a new fact.
///
/// For explicit facts the acting subject is always included, so the creator
/// can read what it just created. Requested subjects are preserved in order,
/// deduplicated.
fn initial_acl_subjects(
    access_mode: AccessMode,
    requested: &[Uuid],
    current_user_id: Uuid,
) -> Vec<Uuid> {
    let mut subjects: Vec<Uuid> = Vec::with_capacity(requested.len() + 1);
    for subject in requested {
        if !subjects.contains(subject) {
            subjects.push(*subject);
        }
    }
    if access_mode == AccessMode::Explicit && !subjects.contains(&current_user_id) {
        subjects.push(current_user_id);
    }
    subjects
}

/// Run a projection call up to `attempts` times; true on success.
async fn retry_projection<F, Fut>(attempts: usize, mut call: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<(), crate::index::IndexError>>,
{
    for attempt in 1..=attempts {
        match call().await {
            Ok(()) => return true,
            Err(e) => {
                tracing::warn!(attempt, error = %e, "index projection failed");
            }
        }
    }
    false
}
