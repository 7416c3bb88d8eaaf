//! # Ports Layer
//!
//! - `inbound` - `SubmissionLifecycleApi`, driven by the gateway
//! - `outbound` - Store and clock traits the service depends on

pub mod inbound;
pub mod outbound;
