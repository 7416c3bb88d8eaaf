//! # In-Memory Store
//!
//! Both store ports over one lock, so a unit of work is applied atomically
//! with respect to every reader.

use crate::domain::entities::{AuditLogEntry, SubmissionFilter, SubmissionStats};
use crate::domain::errors::StoreError;
use crate::ports::outbound::{
    AuditLogStore, CommitReceipt, SubmissionStore, SubmissionWrite, UnitOfWork,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Submission, SubmissionId};
use std::collections::HashMap;

#[derive(Default)]
struct State {
    submissions: HashMap<SubmissionId, Submission>,
    audit: Vec<AuditLogEntry>,
    next_audit_id: u64,
}

/// In-memory submission and audit store.
#[derive(Default)]
pub struct InMemorySubmissionStore {
    state: RwLock<State>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the audit log.
    pub fn seed(&self, submission: Submission) {
        self.state
            .write()
            .submissions
            .insert(submission.id, submission);
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn get(&self, id: &SubmissionId) -> Result<Option<Submission>, StoreError> {
        Ok(self.state.read().submissions.get(id).cloned())
    }

    async fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, StoreError> {
        let state = self.state.read();
        let mut matching: Vec<Submission> = state
            .submissions
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        drop(state);

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    async fn commit(&self, unit: UnitOfWork) -> Result<CommitReceipt, StoreError> {
        let mut state = self.state.write();

        // All checks happen before the first mutation.
        let stored = match unit.write {
            SubmissionWrite::Insert(mut submission) => {
                if state.submissions.contains_key(&submission.id) {
                    return Err(StoreError::DuplicateId(submission.id));
                }
                submission.version = 1;
                submission
            }
            SubmissionWrite::Update {
                mut submission,
                expected_version,
            } => {
                let current = state
                    .submissions
                    .get(&submission.id)
                    .ok_or(StoreError::Missing(submission.id))?;
                if current.version != expected_version {
                    return Err(StoreError::Conflict {
                        id: submission.id,
                        expected: expected_version,
                        actual: current.version,
                    });
                }
                submission.version = expected_version + 1;
                submission
            }
        };

        state.next_audit_id += 1;
        let audit = AuditLogEntry::from_new(state.next_audit_id, unit.audit);
        state.audit.push(audit.clone());
        state.submissions.insert(stored.id, stored.clone());

        Ok(CommitReceipt {
            submission: stored,
            audit,
        })
    }

    async fn stats(&self) -> Result<SubmissionStats, StoreError> {
        let state = self.state.read();
        let mut stats = SubmissionStats::default();
        for submission in state.submissions.values() {
            stats.record(submission);
        }
        Ok(stats)
    }
}

#[async_trait]
impl AuditLogStore for InMemorySubmissionStore {
    async fn entries_for(
        &self,
        resource_id: &SubmissionId,
    ) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(self
            .state
            .read()
            .audit
            .iter()
            .filter(|e| &e.resource_id == resource_id)
            .cloned()
            .collect())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(self
            .state
            .read()
            .audit
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.state.read().audit.len() as u64)
    }
}
