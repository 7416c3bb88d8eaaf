//! # Submission Entity
//!
//! One proposed citation source and its verification state.
//!
//! ## Lifecycle Invariant
//!
//! `status == Pending` if and only if `verifier_id` and `verified_at` are both
//! unset. Approved and rejected records are terminal for approve/reject.

use crate::errors::ParseError;
use crate::identity::CountryCode;
use crate::ids::{SubmissionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Verification status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            other => Err(ParseError::unknown("status", other)),
        }
    }
}

/// Source category proposed by the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Primary,
    Secondary,
    Unreliable,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Primary => "primary",
            Category::Secondary => "secondary",
            Category::Unreliable => "unreliable",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Category::Primary),
            "secondary" => Ok(Category::Secondary),
            "unreliable" => Ok(Category::Unreliable),
            other => Err(ParseError::unknown("category", other)),
        }
    }
}

/// Medium of the cited source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Article,
    Pdf,
    Video,
    Other,
}

/// Verifier assessment recorded on approval or rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credibility {
    High,
    Medium,
    Low,
    NotCredible,
}

impl Credibility {
    /// Default assessment for an approved source of the given category.
    pub fn for_approved(category: Category) -> Self {
        match category {
            Category::Primary => Credibility::High,
            Category::Secondary => Credibility::Medium,
            Category::Unreliable => Credibility::Low,
        }
    }
}

/// A reference submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub url: String,
    pub title: String,
    pub publisher: String,
    pub country: CountryCode,
    pub category: Category,
    pub submitter_id: UserId,
    pub media_type: MediaType,
    pub created_at: DateTime<Utc>,

    pub status: SubmissionStatus,
    pub verifier_id: Option<UserId>,
    pub verifier_notes: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub credibility: Option<Credibility>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every committed mutation; used for optimistic updates.
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// Whether the pending/verifier invariant holds for this record.
    pub fn is_lifecycle_consistent(&self) -> bool {
        let unverified = self.verifier_id.is_none() && self.verified_at.is_none();
        (self.status == SubmissionStatus::Pending) == unverified
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
