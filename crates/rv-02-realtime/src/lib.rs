//! # Realtime Notifications (rv-02)
//!
//! Delivers committed lifecycle events to exactly the connected observers
//! that should see them.
//!
//! ## Channels
//!
//! Every connection is a member of `user:{id}` and `role:{role}`. Verifiers
//! and admins are also members of `country:{code}`. Memberships follow from
//! identity; clients cannot subscribe to anything else.
//!
//! ## Routing
//!
//! | Event | Wire name | Channels |
//! |---|---|---|
//! | SubmissionCreated | `submission:created` | `role:verifier`, `role:admin`, `country:{c}` |
//! | SubmissionTransitioned | `submission:verified` | `user:{submitter}`, `role:admin`, `country:{c}` |
//! | SubmissionUpdated | `submission:updated` | `role:admin`, `country:{c}` |
//! | SubmissionDeleted | `submission:deleted` | `role:admin`, `country:{c}` |
//! | SystemNotice | `system:notification` | every connection |
//!
//! Targets are unioned per event, so a connection in several matching
//! channels receives the event once. Delivery never blocks: each connection
//! owns a bounded outbound queue and a full queue drops the frame.

pub mod channel;
pub mod errors;
pub mod fanout;
pub mod message;
pub mod registry;

pub use channel::{channels_for, route, Channel, Route};
pub use errors::{DeliveryFailure, RegistryError};
pub use fanout::{DeliveryReport, FanoutSnapshot, FanoutStats, NotificationFanout};
pub use message::{wire, Frame, OutboundMessage};
pub use registry::{
    authenticate_and_admit, Admission, ConnectionInfo, ConnectionRegistry,
    InMemoryConnectionRegistry, DEFAULT_QUEUE_CAPACITY,
};
