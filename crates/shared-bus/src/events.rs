//! # Domain Events
//!
//! Every event that flows through the shared bus. Submission events are
//! emitted only after the corresponding unit of work committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{Principal, Submission, SubmissionStatus, UserId};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    /// A new submission entered the `pending` state.
    SubmissionCreated {
        submission: Submission,
        actor: Principal,
    },

    /// A pending submission was approved or rejected.
    SubmissionTransitioned {
        submission: Submission,
        actor: Principal,
        from: SubmissionStatus,
    },

    /// Verifier notes changed; status untouched.
    SubmissionUpdated {
        submission: Submission,
        actor: Principal,
    },

    /// An administrator tombstoned the submission.
    SubmissionDeleted {
        submission: Submission,
        actor: Principal,
    },

    /// Broadcast to every live connection.
    SystemNotice(SystemNotice),
}

impl DomainEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::SubmissionCreated { .. }
            | Self::SubmissionTransitioned { .. }
            | Self::SubmissionUpdated { .. }
            | Self::SubmissionDeleted { .. } => EventTopic::Submissions,
            Self::SystemNotice(_) => EventTopic::System,
        }
    }

    /// The submission this event is about, if any.
    #[must_use]
    pub fn submission(&self) -> Option<&Submission> {
        match self {
            Self::SubmissionCreated { submission, .. }
            | Self::SubmissionTransitioned { submission, .. }
            | Self::SubmissionUpdated { submission, .. }
            | Self::SubmissionDeleted { submission, .. } => Some(submission),
            Self::SystemNotice(_) => None,
        }
    }

    /// When the underlying change happened.
    #[must_use]
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::SystemNotice(notice) => notice.issued_at,
            Self::SubmissionDeleted { submission, .. } => {
                submission.deleted_at.unwrap_or(submission.updated_at)
            }
            other => other
                .submission()
                .map(|s| s.updated_at)
                .unwrap_or_else(Utc::now),
        }
    }
}

/// Severity of a system notice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    #[default]
    Info,
    Warning,
    Critical,
}

/// Operator message sent to every connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemNotice {
    pub message: String,
    pub level: NoticeLevel,
    pub issued_by: UserId,
    pub issued_at: DateTime<Utc>,
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Submission lifecycle events.
    Submissions,
    /// Operator broadcasts.
    System,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &DomainEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use shared_types::{Category, CountryCode, MediaType, Role, SubmissionId};

    pub fn principal(role: Role, country: &str) -> Principal {
        Principal::new(
            UserId::new(format!("{}-{}", role, country)).unwrap(),
            role,
            CountryCode::parse(country).unwrap(),
        )
    }

    pub fn submission(country: &str) -> Submission {
        let now = Utc::now();
        Submission {
            id: SubmissionId::new(),
            url: "https://news.example/story".into(),
            title: "Story".into(),
            publisher: "Example News".into(),
            country: CountryCode::parse(country).unwrap(),
            category: Category::Secondary,
            submitter_id: UserId::new("contributor-1").unwrap(),
            media_type: MediaType::Article,
            created_at: now,
            status: SubmissionStatus::Pending,
            verifier_id: None,
            verifier_notes: None,
            verified_at: None,
            credibility: None,
            updated_at: now,
            version: 1,
            deleted_at: None,
        }
    }

    pub fn created(country: &str) -> DomainEvent {
        DomainEvent::SubmissionCreated {
            submission: submission(country),
            actor: principal(Role::Contributor, country),
        }
    }

    pub fn notice() -> DomainEvent {
        DomainEvent::SystemNotice(SystemNotice {
            message: "maintenance at 22:00".into(),
            level: NoticeLevel::Warning,
            issued_by: UserId::new("admin-1").unwrap(),
            issued_at: Utc::now(),
        })
    }
}
