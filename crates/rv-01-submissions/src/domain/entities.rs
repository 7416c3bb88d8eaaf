//! # Core Domain Entities
//!
//! Requests, audit records and read models of the lifecycle subsystem.

use crate::domain::errors::LifecycleError;
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use shared_types::{
    Category, CountryCode, Credibility, MediaType, Submission, SubmissionId, SubmissionStatus,
    UserId,
};
use std::collections::BTreeMap;
use std::fmt;

/// A lifecycle action requested by an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Approve,
    Reject,
    UpdateNotes,
    /// Administrative tombstone.
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Approve,
        Action::Reject,
        Action::UpdateNotes,
        Action::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Approve => "approve",
            Action::Reject => "reject",
            Action::UpdateNotes => "update-notes",
            Action::Delete => "delete",
        }
    }

    /// Approve and reject are the only actions accepted in a batch.
    pub fn is_batchable(&self) -> bool {
        matches!(self, Action::Approve | Action::Reject)
    }

    /// Audit action recorded when this action commits.
    pub fn audit_action(&self) -> AuditAction {
        match self {
            Action::Approve => AuditAction::Approved,
            Action::Reject => AuditAction::Rejected,
            Action::UpdateNotes => AuditAction::Updated,
            Action::Delete => AuditAction::Deleted,
        }
    }

    /// Request method recorded in the audit trail.
    pub fn method(&self) -> &'static str {
        match self {
            Action::Delete => "DELETE",
            _ => "PATCH",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Approved,
    Rejected,
    Updated,
    Deleted,
}

/// Audit entry as handed to the store; the store assigns the sequence id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuditEntry {
    pub actor_id: UserId,
    pub action: AuditAction,
    pub resource_id: SubmissionId,
    pub method: String,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

/// A committed, immutable audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    /// Store-assigned sequence number; insertion order is causal order.
    pub id: u64,
    pub actor_id: UserId,
    pub action: AuditAction,
    pub resource_id: SubmissionId,
    pub method: String,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

impl AuditLogEntry {
    pub fn from_new(id: u64, entry: NewAuditEntry) -> Self {
        Self {
            id,
            actor_id: entry.actor_id,
            action: entry.action,
            resource_id: entry.resource_id,
            method: entry.method,
            timestamp: entry.timestamp,
            details: entry.details,
        }
    }
}

/// Fields a contributor supplies when proposing a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub url: String,
    pub title: String,
    pub publisher: String,
    pub country: CountryCode,
    pub category: Category,
    #[serde(default)]
    pub media_type: MediaType,
}

/// Optional payload of a transition request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionInput {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub credibility: Option<Credibility>,
}

impl TransitionInput {
    pub fn with_notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            credibility: None,
        }
    }
}

/// Per-id result of a batch transition.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItemOutcome {
    pub id: SubmissionId,
    pub result: Result<Submission, LifecycleError>,
}

impl BatchItemOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl Serialize for BatchItemOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BatchItemOutcome", 3)?;
        state.serialize_field("id", &self.id)?;
        match &self.result {
            Ok(submission) => {
                state.serialize_field("ok", &true)?;
                state.serialize_field("submission", submission)?;
            }
            Err(err) => {
                state.serialize_field("ok", &false)?;
                state.serialize_field(
                    "error",
                    &serde_json::json!({ "kind": err.kind(), "message": err.to_string() }),
                )?;
            }
        }
        state.end()
    }
}

/// Listing filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionFilter {
    pub status: Option<SubmissionStatus>,
    pub country: Option<CountryCode>,
    pub category: Option<Category>,
    pub submitter_id: Option<UserId>,
    pub limit: Option<usize>,
}

impl SubmissionFilter {
    pub fn matches(&self, submission: &Submission) -> bool {
        !submission.is_deleted()
            && self.status.map_or(true, |s| s == submission.status)
            && self.country.map_or(true, |c| c == submission.country)
            && self.category.map_or(true, |c| c == submission.category)
            && self
                .submitter_id
                .as_ref()
                .map_or(true, |u| u == &submission.submitter_id)
    }
}

/// Aggregate counts over live submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStats {
    pub total: u64,
    pub by_status: BTreeMap<SubmissionStatus, u64>,
    pub by_country: BTreeMap<CountryCode, u64>,
    pub by_category: BTreeMap<Category, u64>,
}

impl SubmissionStats {
    /// Count one submission. Tombstoned records are skipped.
    pub fn record(&mut self, submission: &Submission) {
        if submission.is_deleted() {
            return;
        }
        self.total += 1;
        *self.by_status.entry(submission.status).or_default() += 1;
        *self.by_country.entry(submission.country).or_default() += 1;
        *self.by_category.entry(submission.category).or_default() += 1;
    }
}
