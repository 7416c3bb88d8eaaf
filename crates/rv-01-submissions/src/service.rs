//! # Lifecycle Service
//!
//! Implements [`SubmissionLifecycleApi`] on top of the transition engine and
//! the store ports.
//!
//! Every mutation follows the same path:
//! 1. Load the record and let the engine decide
//! 2. Commit the record write and its audit entry as one unit of work,
//!    conditioned on the version that was read
//! 3. Publish the event, best effort, only after the commit returned


use crate::adapters::{InMemorySubmissionStore, SystemTimeSource};
use crate::domain::config::LifecycleConfig;
use crate::domain::entities::{
    Action, AuditAction, AuditLogEntry, BatchItemOutcome, NewAuditEntry, NewSubmission,
    SubmissionFilter, SubmissionStats, TransitionInput,
};
use crate::domain::errors::{LifecycleError, StoreError};
use crate::domain::transition::{self, Decision};
use crate::domain::validation;
use crate::ports::inbound::SubmissionLifecycleApi;
use crate::ports::outbound::{AuditLogStore, SubmissionStore, TimeSource, UnitOfWork};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use shared_bus::{DomainEvent, EventPublisher};
use shared_types::{Principal, Submission, SubmissionId, SubmissionStatus};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A stale-version commit is retried once with a fresh read.
const MAX_COMMIT_ATTEMPTS: usize = 2;

/// Dependencies for [`LifecycleService`].
pub struct LifecycleDependencies {
    pub store: Arc<dyn SubmissionStore>,
    pub audit: Arc<dyn AuditLogStore>,
    pub publisher: Arc<dyn EventPublisher>,
    pub time_source: Arc<dyn TimeSource>,
}

/// The submission lifecycle service.
pub struct LifecycleService {
    store: Arc<dyn SubmissionStore>,
    audit: Arc<dyn AuditLogStore>,
    publisher: Arc<dyn EventPublisher>,
    time_source: Arc<dyn TimeSource>,
    config: LifecycleConfig,
}

impl LifecycleService {
    pub fn new(deps: LifecycleDependencies, config: LifecycleConfig) -> Self {
        Self {
            store: deps.store,
            audit: deps.audit,
            publisher: deps.publisher,
            time_source: deps.time_source,
            config,
        }
    }

    /// Service over a fresh [`InMemorySubmissionStore`].
    pub fn new_in_memory(publisher: Arc<dyn EventPublisher>, config: LifecycleConfig) -> Self {
        let store = Arc::new(InMemorySubmissionStore::new());
        Self::new(
            LifecycleDependencies {
                store: store.clone(),
                audit: store,
                publisher,
                time_source: Arc::new(SystemTimeSource),
            },
            config,
        )
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    async fn load(&self, id: &SubmissionId) -> Result<Option<Submission>, LifecycleError> {
        self.store.get(id).await.map_err(|e| {
            error!(submission_id = %id, error = %e, "Submission read failed");
            LifecycleError::from(e)
        })
    }

    async fn load_live(&self, id: &SubmissionId) -> Result<Submission, LifecycleError> {
        match self.load(id).await? {
            Some(s) if !s.is_deleted() => Ok(s),
            _ => Err(LifecycleError::not_found(id)),
        }
    }

    async fn publish(&self, event: DomainEvent) {
        let receivers = self.publisher.publish(event).await;
        debug!(receivers, "Lifecycle event handed to bus");
    }

    async fn run_transition(
        &self,
        id: &SubmissionId,
        action: Action,
        actor: &Principal,
        input: &TransitionInput,
        batch: bool,
    ) -> Result<Submission, LifecycleError> {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let current = self.load(id).await?;

            let next = match transition::decide(current.as_ref(), action, actor) {
                Ok(Decision::Allowed(next)) => next,
                Ok(Decision::Rejected(kind)) => {
                    debug!(
                        submission_id = %id,
                        action = %action,
                        actor = %actor.user_id,
                        rejection = ?kind,
                        "Transition rejected"
                    );
                    return Err(kind.into_error(id));
                }
                Err(fault) => {
                    error!(submission_id = %id, error = %fault, "Corrupted submission record");
                    return Err(fault.into());
                }
            };
            let Some(before) = current else {
                return Err(LifecycleError::not_found(id));
            };

            let now = self.time_source.now();
            let after = transition::apply(&before, next, actor, input, now);
            let audit = transition::audit_entry(&before, &after, action, actor, batch);

            match self
                .store
                .commit(UnitOfWork::update(after, before.version, audit))
                .await
            {
                Ok(receipt) => {
                    info!(
                        submission_id = %id,
                        action = %action,
                        actor = %actor.user_id,
                        status = %receipt.submission.status,
                        version = receipt.submission.version,
                        "Submission transition committed"
                    );
                    let event = lifecycle_event(action, &before, &receipt.submission, actor);
                    self.publish(event).await;
                    return Ok(receipt.submission);
                }
                Err(StoreError::Conflict { .. }) if attempt < MAX_COMMIT_ATTEMPTS => {
                    debug!(submission_id = %id, attempt, "Version conflict, retrying");
                }
                Err(StoreError::Conflict { .. }) => {
                    warn!(submission_id = %id, "Version conflict persisted after retry");
                    return Err(LifecycleError::Conflict(*id));
                }
                Err(e) => {
                    error!(submission_id = %id, error = %e, "Commit failed");
                    return Err(e.into());
                }
            }
        }

        Err(LifecycleError::Conflict(*id))
    }
}

fn lifecycle_event(
    action: Action,
    before: &Submission,
    after: &Submission,
    actor: &Principal,
) -> DomainEvent {
    let submission = after.clone();
    let actor = actor.clone();
    match action {
        Action::Approve | Action::Reject => DomainEvent::SubmissionTransitioned {
            submission,
            actor,
            from: before.status,
        },
        Action::UpdateNotes => DomainEvent::SubmissionUpdated { submission, actor },
        Action::Delete => DomainEvent::SubmissionDeleted { submission, actor },
    }
}

#[async_trait]
impl SubmissionLifecycleApi for LifecycleService {
    async fn create_submission(
        &self,
        input: NewSubmission,
        submitter: &Principal,
    ) -> Result<Submission, LifecycleError> {
        let input = validation::normalize_new_submission(input, &self.config)?;
        let now = self.time_source.now();

        let submission = Submission {
            id: SubmissionId::new(),
            url: input.url,
            title: input.title,
            publisher: input.publisher,
            country: input.country,
            category: input.category,
            submitter_id: submitter.user_id.clone(),
            media_type: input.media_type,
            created_at: now,
            status: SubmissionStatus::Pending,
            verifier_id: None,
            verifier_notes: None,
            verified_at: None,
            credibility: None,
            updated_at: now,
            version: 0,
            deleted_at: None,
        };
        let audit = NewAuditEntry {
            actor_id: submitter.user_id.clone(),
            action: AuditAction::Created,
            resource_id: submission.id,
            method: "POST".to_string(),
            timestamp: now,
            details: json!({
                "to": SubmissionStatus::Pending,
                "url": submission.url,
                "country": submission.country,
                "category": submission.category,
            }),
        };

        let receipt = self
            .store
            .commit(UnitOfWork::insert(submission, audit))
            .await
            .map_err(|e| {
                error!(error = %e, "Submission insert failed");
                LifecycleError::from(e)
            })?;

        info!(
            submission_id = %receipt.submission.id,
            submitter = %submitter.user_id,
            country = %receipt.submission.country,
            "Submission created"
        );
        self.publish(DomainEvent::SubmissionCreated {
            submission: receipt.submission.clone(),
            actor: submitter.clone(),
        })
        .await;

        Ok(receipt.submission)
    }

    async fn transition(
        &self,
        id: &SubmissionId,
        action: Action,
        actor: &Principal,
        input: TransitionInput,
    ) -> Result<Submission, LifecycleError> {
        let input = validation::normalize_transition_input(action, input, &self.config)?;
        self.run_transition(id, action, actor, &input, false).await
    }

    async fn batch_transition(
        &self,
        ids: &[String],
        action: Action,
        actor: &Principal,
    ) -> Result<Vec<BatchItemOutcome>, LifecycleError> {
        let ids = validation::validate_batch(ids, action, &self.config)?;
        let input = TransitionInput::default();

        let outcomes = join_all(ids.iter().map(|id| {
            let input = &input;
            async move {
                BatchItemOutcome {
                    id: *id,
                    result: self.run_transition(id, action, actor, input, true).await,
                }
            }
        }))
        .await;

        let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
        info!(
            action = %action,
            actor = %actor.user_id,
            total = outcomes.len(),
            succeeded,
            "Batch transition finished"
        );
        Ok(outcomes)
    }

    async fn get_submission(&self, id: &SubmissionId) -> Result<Submission, LifecycleError> {
        self.load_live(id).await
    }

    async fn list_submissions(
        &self,
        filter: &SubmissionFilter,
    ) -> Result<Vec<Submission>, LifecycleError> {
        Ok(self.store.list(filter).await?)
    }

    async fn audit_trail(&self, id: &SubmissionId) -> Result<Vec<AuditLogEntry>, LifecycleError> {
        self.load_live(id).await?;
        Ok(self.audit.entries_for(id).await?)
    }

    async fn recent_activity(&self, limit: usize) -> Result<Vec<AuditLogEntry>, LifecycleError> {
        Ok(self.audit.recent(limit).await?)
    }

    async fn statistics(&self) -> Result<SubmissionStats, LifecycleError> {
        Ok(self.store.stats().await?)
    }
}
