//! # Domain Errors
//!
//! - `LifecycleError` is what callers of the lifecycle API see.
//! - `StoreError` is what the outbound store ports report.

use shared_types::{ErrorKind, SubmissionId, SubmissionStatus};
use thiserror::Error;

/// Errors returned by lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// No live submission with this id.
    #[error("submission {0} not found")]
    NotFound(String),

    /// The actor's role or country does not permit the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Approve/reject on a record that already left `pending`.
    #[error("submission {id} is already {status}")]
    AlreadyFinalized {
        id: SubmissionId,
        status: SubmissionStatus,
    },

    /// Malformed input; nothing was attempted.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The record kept changing underneath the request.
    #[error("submission {0} was modified concurrently, retry the request")]
    Conflict(SubmissionId),

    /// Storage or invariant fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LifecycleError {
    /// Stable client-visible kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::NotFound(_) => ErrorKind::NotFound,
            LifecycleError::Forbidden(_) => ErrorKind::Forbidden,
            LifecycleError::AlreadyFinalized { .. } => ErrorKind::AlreadyFinalized,
            LifecycleError::Validation(_) => ErrorKind::ValidationError,
            LifecycleError::Conflict(_) => ErrorKind::ConflictError,
            LifecycleError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn not_found(id: &SubmissionId) -> Self {
        LifecycleError::NotFound(id.to_string())
    }
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { id, .. } => LifecycleError::Conflict(id),
            StoreError::Missing(id) => LifecycleError::not_found(&id),
            other => LifecycleError::Internal(other.to_string()),
        }
    }
}

/// Errors reported by the submission and audit stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The stored version no longer matches the one the update was based on.
    #[error("version conflict on {id}: expected {expected}, found {actual}")]
    Conflict {
        id: SubmissionId,
        expected: u64,
        actual: u64,
    },

    /// Insert of an id that already exists.
    #[error("submission {0} already exists")]
    DuplicateId(SubmissionId),

    /// Update of an id that does not exist.
    #[error("submission {0} does not exist")]
    Missing(SubmissionId),

    /// Backend unreachable or failed mid-operation. Nothing was applied.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
