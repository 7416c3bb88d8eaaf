//! # Submission Lifecycle (rv-01)
//!
//! Advances reference submissions through `pending → approved | rejected`
//! under role and country constraints, records one audit entry per committed
//! change, and publishes the resulting [`DomainEvent`](shared_bus::DomainEvent)
//! once the change is durable.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Pending Consistency | `pending` iff no verifier and no verification time |
//! | 2 | Terminal States | approved/rejected records refuse approve/reject |
//! | 3 | Country Scope | verifiers act only inside their own country |
//! | 4 | Atomic Unit of Work | submission write and audit entry commit together |
//! | 5 | Commit Then Publish | no event for a change that did not commit |
//! | 6 | Optimistic Writes | updates are conditioned on the version that was read |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Transition engine, entities, validation, errors
//! - `ports/` - Inbound API trait, outbound store traits
//! - `adapters/` - In-memory store, system clock
//! - `service.rs` - Application service implementing the API
//!
//! ## Usage
//!
//! ```ignore
//! use rv_01_submissions::{LifecycleService, LifecycleConfig, SubmissionLifecycleApi};
//!
//! let bus = Arc::new(InMemoryEventBus::new());
//! let service = LifecycleService::new_in_memory(bus, LifecycleConfig::default());
//!
//! let created = service.create_submission(input, &contributor).await?;
//! let approved = service
//!     .transition(&created.id, Action::Approve, &verifier, TransitionInput::default())
//!     .await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{InMemorySubmissionStore, SystemTimeSource};
pub use domain::config::LifecycleConfig;
pub use domain::entities::{
    Action, AuditAction, AuditLogEntry, BatchItemOutcome, NewAuditEntry, NewSubmission,
    SubmissionFilter, SubmissionStats, TransitionInput,
};
pub use domain::errors::{LifecycleError, StoreError};
pub use domain::transition::{decide, Decision, EngineFault, Next, RejectionKind};
pub use ports::inbound::SubmissionLifecycleApi;
pub use ports::outbound::{
    AuditLogStore, CommitReceipt, SubmissionStore, SubmissionWrite, TimeSource, UnitOfWork,
};
pub use service::LifecycleService;
