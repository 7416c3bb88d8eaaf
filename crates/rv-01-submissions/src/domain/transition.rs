//! # Transition Engine
//!
//! Pure decision function over `(current record, action, actor)`.
//!
//! | Current | Action | Actor | Outcome |
//! |---|---|---|---|
//! | pending | approve/reject | admin, or verifier of the record's country | approved/rejected |
//! | pending | approve/reject | anyone else | Forbidden |
//! | approved/rejected | approve/reject | anyone | AlreadyFinalized |
//! | any | update-notes | admin, or verifier of the record's country | notes replaced |
//! | any | delete | admin | tombstone |
//! | absent or tombstoned | any | anyone | NotFound |
//!
//! No I/O happens here; [`apply`] and [`audit_entry`] build the values the
//! service commits once [`decide`] allows the action.

use crate::domain::entities::{Action, NewAuditEntry, TransitionInput};
use crate::domain::errors::LifecycleError;
use chrono::{DateTime, Utc};
use serde_json::json;
use shared_types::{Credibility, Principal, Submission, SubmissionId, SubmissionStatus};
use thiserror::Error;

/// What an allowed action does to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Leave `pending` for the given terminal status.
    Finalize(SubmissionStatus),
    /// Replace verifier notes; status untouched.
    Notes,
    /// Write the deletion tombstone.
    Tombstone,
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    NotFound,
    Forbidden(&'static str),
    AlreadyFinalized(SubmissionStatus),
}

impl RejectionKind {
    pub fn into_error(self, id: &SubmissionId) -> LifecycleError {
        match self {
            RejectionKind::NotFound => LifecycleError::not_found(id),
            RejectionKind::Forbidden(reason) => LifecycleError::Forbidden(reason.to_string()),
            RejectionKind::AlreadyFinalized(status) => {
                LifecycleError::AlreadyFinalized { id: *id, status }
            }
        }
    }
}

/// Engine verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed(Next),
    Rejected(RejectionKind),
}

/// The loaded record itself is broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineFault {
    #[error("submission {id} is {status} but its verifier fields disagree")]
    CorruptedRecord {
        id: SubmissionId,
        status: SubmissionStatus,
    },
}

impl From<EngineFault> for LifecycleError {
    fn from(fault: EngineFault) -> Self {
        LifecycleError::Internal(fault.to_string())
    }
}

/// Decide whether `actor` may perform `action` on `current`.
pub fn decide(
    current: Option<&Submission>,
    action: Action,
    actor: &Principal,
) -> Result<Decision, EngineFault> {
    let Some(submission) = current.filter(|s| !s.is_deleted()) else {
        return Ok(Decision::Rejected(RejectionKind::NotFound));
    };

    if !submission.is_lifecycle_consistent() {
        return Err(EngineFault::CorruptedRecord {
            id: submission.id,
            status: submission.status,
        });
    }

    let decision = match action {
        Action::Approve | Action::Reject => {
            if submission.status.is_final() {
                Decision::Rejected(RejectionKind::AlreadyFinalized(submission.status))
            } else if !actor.can_verify_in(&submission.country) {
                Decision::Rejected(RejectionKind::Forbidden(
                    "only admins or verifiers of the submission's country may review it",
                ))
            } else if action == Action::Approve {
                Decision::Allowed(Next::Finalize(SubmissionStatus::Approved))
            } else {
                Decision::Allowed(Next::Finalize(SubmissionStatus::Rejected))
            }
        }
        Action::UpdateNotes => {
            if actor.can_verify_in(&submission.country) {
                Decision::Allowed(Next::Notes)
            } else {
                Decision::Rejected(RejectionKind::Forbidden(
                    "only admins or verifiers of the submission's country may edit notes",
                ))
            }
        }
        Action::Delete => {
            if actor.is_admin() {
                Decision::Allowed(Next::Tombstone)
            } else {
                Decision::Rejected(RejectionKind::Forbidden("only admins may delete submissions"))
            }
        }
    };

    Ok(decision)
}

/// Build the record that results from an allowed action.
///
/// The version is left as read; the store bumps it on commit.
pub fn apply(
    current: &Submission,
    next: Next,
    actor: &Principal,
    input: &TransitionInput,
    now: DateTime<Utc>,
) -> Submission {
    let mut updated = current.clone();
    updated.updated_at = now;

    match next {
        Next::Finalize(status) => {
            updated.status = status;
            updated.verifier_id = Some(actor.user_id.clone());
            updated.verified_at = Some(now);
            if let Some(notes) = &input.notes {
                updated.verifier_notes = Some(notes.clone());
            }
            updated.credibility = Some(input.credibility.unwrap_or(match status {
                SubmissionStatus::Rejected => Credibility::NotCredible,
                _ => Credibility::for_approved(current.category),
            }));
        }
        Next::Notes => {
            updated.verifier_notes = input.notes.clone();
        }
        Next::Tombstone => {
            updated.deleted_at = Some(now);
        }
    }

    updated
}

/// Audit record for a committed action.
pub fn audit_entry(
    before: &Submission,
    after: &Submission,
    action: Action,
    actor: &Principal,
    batch: bool,
) -> NewAuditEntry {
    NewAuditEntry {
        actor_id: actor.user_id.clone(),
        action: action.audit_action(),
        resource_id: before.id,
        method: action.method().to_string(),
        timestamp: after.updated_at,
        details: json!({
            "from": before.status,
            "to": after.status,
            "notes": after.verifier_notes,
            "credibility": after.credibility,
            "batch": batch,
        }),
    }
}
