//! # Shared Types Crate
//!
//! Domain primitives shared by the lifecycle, realtime and gateway crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Submission`, `Principal` and the identifier
//!   newtypes are defined once, here.
//! - **Parse, don't validate**: `CountryCode`, `SubmissionId` and the enums only
//!   exist in their canonical form; raw strings are converted at the edges.
//! - **Identity is external**: `IdentityResolver` is the port through which a
//!   bearer credential becomes a `Principal`.

pub mod errors;
pub mod identity;
pub mod ids;
pub mod submission;

pub use errors::*;
pub use identity::*;
pub use ids::*;
pub use submission::*;
