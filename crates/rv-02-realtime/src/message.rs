//! # Wire Messages
//!
//! Server-to-client frames: `{"event": "<name>", "data": {...}, "emittedAt": "<rfc3339>"}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_bus::DomainEvent;
use shared_types::{ErrorKind, Principal, Submission};
use std::sync::Arc;

use crate::channel::Channel;

/// An encoded frame, shared between every recipient of one event.
pub type Frame = Arc<str>;

/// Event names as they appear on the wire.
pub mod wire {
    pub const SUBMISSION_CREATED: &str = "submission:created";
    pub const SUBMISSION_VERIFIED: &str = "submission:verified";
    pub const SUBMISSION_UPDATED: &str = "submission:updated";
    pub const SUBMISSION_DELETED: &str = "submission:deleted";
    pub const SYSTEM_NOTIFICATION: &str = "system:notification";
    pub const CONNECTION_READY: &str = "connection:ready";
    pub const PONG: &str = "pong";
    pub const ERROR: &str = "error";
}

/// One server-to-client message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub event: String,
    pub data: Value,
    pub emitted_at: DateTime<Utc>,
}

fn actor_json(actor: &Principal) -> Value {
    json!({ "userId": actor.user_id, "role": actor.role })
}

fn submission_json(submission: &Submission, actor: &Principal) -> Value {
    json!({ "submission": submission, "actor": actor_json(actor) })
}

impl OutboundMessage {
    pub fn new(event: &str, data: Value) -> Self {
        Self {
            event: event.to_string(),
            data,
            emitted_at: Utc::now(),
        }
    }

    pub fn from_event(event: &DomainEvent) -> Self {
        match event {
            DomainEvent::SubmissionCreated { submission, actor } => {
                Self::new(wire::SUBMISSION_CREATED, submission_json(submission, actor))
            }
            DomainEvent::SubmissionTransitioned {
                submission,
                actor,
                from,
            } => Self::new(
                wire::SUBMISSION_VERIFIED,
                json!({
                    "submission": submission,
                    "actor": actor_json(actor),
                    "from": from,
                    "status": submission.status,
                    "notes": submission.verifier_notes,
                    "credibility": submission.credibility,
                    "verifiedAt": submission.verified_at,
                }),
            ),
            DomainEvent::SubmissionUpdated { submission, actor } => {
                Self::new(wire::SUBMISSION_UPDATED, submission_json(submission, actor))
            }
            DomainEvent::SubmissionDeleted { submission, actor } => Self::new(
                wire::SUBMISSION_DELETED,
                json!({
                    "submissionId": submission.id,
                    "country": submission.country,
                    "actor": actor_json(actor),
                }),
            ),
            DomainEvent::SystemNotice(notice) => Self::new(
                wire::SYSTEM_NOTIFICATION,
                serde_json::to_value(notice).unwrap_or(Value::Null),
            ),
        }
    }

    /// Sent once after a successful handshake.
    pub fn ready(principal: &Principal, channels: &[Channel]) -> Self {
        Self::new(
            wire::CONNECTION_READY,
            json!({
                "userId": principal.user_id,
                "role": principal.role,
                "country": principal.country,
                "channels": channels,
            }),
        )
    }

    pub fn pong() -> Self {
        Self::new(wire::PONG, Value::Null)
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(
            wire::ERROR,
            json!({ "kind": kind, "message": message.into() }),
        )
    }

    pub fn encode(&self) -> Result<Frame, serde_json::Error> {
        Ok(Arc::from(serde_json::to_string(self)?))
    }
}
