//! # Inbound Ports (Driving Ports)
//!
//! The public API of the lifecycle subsystem.

use crate::domain::entities::{
    Action, AuditLogEntry, BatchItemOutcome, NewSubmission, SubmissionFilter, SubmissionStats,
    TransitionInput,
};
use crate::domain::errors::LifecycleError;
use async_trait::async_trait;
use shared_types::{Principal, Submission, SubmissionId};

/// Primary API for submission lifecycle operations.
///
/// Every mutating call commits its record change and audit entry together,
/// then publishes the matching event. A rejected call writes nothing and
/// publishes nothing.
#[async_trait]
pub trait SubmissionLifecycleApi: Send + Sync {
    /// Propose a new source. The record starts in `pending`.
    ///
    /// ## Errors
    ///
    /// - `Validation`: malformed url, blank title or publisher
    async fn create_submission(
        &self,
        input: NewSubmission,
        submitter: &Principal,
    ) -> Result<Submission, LifecycleError>;

    /// Apply one lifecycle action.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: absent or tombstoned
    /// - `Forbidden`: role or country does not permit the action
    /// - `AlreadyFinalized`: approve/reject on a non-pending record
    /// - `Conflict`: the record changed twice underneath the request
    async fn transition(
        &self,
        id: &SubmissionId,
        action: Action,
        actor: &Principal,
        input: TransitionInput,
    ) -> Result<Submission, LifecycleError>;

    /// Approve or reject many records. Validation failures reject the whole
    /// batch; otherwise one outcome per id is returned, in input order.
    async fn batch_transition(
        &self,
        ids: &[String],
        action: Action,
        actor: &Principal,
    ) -> Result<Vec<BatchItemOutcome>, LifecycleError>;

    /// Tombstone a submission. Admin only.
    async fn delete_submission(
        &self,
        id: &SubmissionId,
        actor: &Principal,
    ) -> Result<Submission, LifecycleError> {
        self.transition(id, Action::Delete, actor, TransitionInput::default())
            .await
    }

    async fn get_submission(&self, id: &SubmissionId) -> Result<Submission, LifecycleError>;

    /// Live submissions matching `filter`, newest first.
    async fn list_submissions(
        &self,
        filter: &SubmissionFilter,
    ) -> Result<Vec<Submission>, LifecycleError>;

    /// Audit entries for one submission, oldest first.
    async fn audit_trail(&self, id: &SubmissionId) -> Result<Vec<AuditLogEntry>, LifecycleError>;

    /// Most recent audit entries across all submissions, newest first.
    async fn recent_activity(&self, limit: usize) -> Result<Vec<AuditLogEntry>, LifecycleError>;

    async fn statistics(&self) -> Result<SubmissionStats, LifecycleError>;
}
