//! # Shared Bus - Event Bus for Committed Lifecycle Events
//!
//! The lifecycle service publishes a [`DomainEvent`] only after its unit of
//! work has committed; the notification fan-out subscribes and delivers.
//!
//! ```text
//! ┌──────────────────┐                    ┌──────────────────┐
//! │ Lifecycle (rv-01)│                    │ Fan-out (rv-02)  │
//! │   commit, then   │    publish()       │                  │
//! │                  │ ──────┐            │                  │
//! └──────────────────┘       │            └──────────────────┘
//!                            ▼                    ↑
//!                      ┌──────────────┐          │
//!                      │  Event Bus   │          │
//!                      │              │ ─────────┘
//!                      └──────────────┘  subscribe()
//! ```
//!
//! ## Guarantees
//!
//! - `publish` never fails and never blocks the publisher; an event with no
//!   live subscriber is dropped and logged.
//! - No replay: subscribers only see events published after they subscribed.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{DomainEvent, EventFilter, EventTopic, NoticeLevel, SystemNotice};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the slowest one lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
