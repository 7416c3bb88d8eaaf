//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the lifecycle service.

use crate::domain::entities::{AuditLogEntry, NewAuditEntry, SubmissionFilter, SubmissionStats};
use crate::domain::errors::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{Submission, SubmissionId};

/// The record half of a unit of work.
#[derive(Debug, Clone)]
pub enum SubmissionWrite {
    /// Store a new record. Fails with `DuplicateId` if the id exists.
    Insert(Submission),
    /// Replace a record, but only if its stored version still equals
    /// `expected_version`.
    Update {
        submission: Submission,
        expected_version: u64,
    },
}

impl SubmissionWrite {
    pub fn id(&self) -> SubmissionId {
        match self {
            SubmissionWrite::Insert(s) => s.id,
            SubmissionWrite::Update { submission, .. } => submission.id,
        }
    }
}

/// One submission write plus its audit entry.
///
/// ## Atomicity
///
/// Either both are applied or neither is.
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    pub write: SubmissionWrite,
    pub audit: NewAuditEntry,
}

impl UnitOfWork {
    pub fn insert(submission: Submission, audit: NewAuditEntry) -> Self {
        Self {
            write: SubmissionWrite::Insert(submission),
            audit,
        }
    }

    pub fn update(submission: Submission, expected_version: u64, audit: NewAuditEntry) -> Self {
        Self {
            write: SubmissionWrite::Update {
                submission,
                expected_version,
            },
            audit,
        }
    }
}

/// What a successful commit produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReceipt {
    /// The record as stored, with its new version.
    pub submission: Submission,
    pub audit: AuditLogEntry,
}

/// Submission persistence.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Read a record, tombstoned or not.
    async fn get(&self, id: &SubmissionId) -> Result<Option<Submission>, StoreError>;

    /// Live records matching `filter`, newest first, capped at `filter.limit`.
    async fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, StoreError>;

    /// Apply a unit of work atomically. The store assigns the new version
    /// (1 for inserts, `expected_version + 1` for updates) and the audit id.
    async fn commit(&self, unit: UnitOfWork) -> Result<CommitReceipt, StoreError>;

    async fn stats(&self) -> Result<SubmissionStats, StoreError>;
}

/// Read side of the append-only audit log. The only writer is
/// [`SubmissionStore::commit`].
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    /// Entries for one resource, in commit order.
    async fn entries_for(&self, resource_id: &SubmissionId)
        -> Result<Vec<AuditLogEntry>, StoreError>;

    /// The newest `limit` entries, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
