//! # Adapters
//!
//! - `memory` - `InMemorySubmissionStore`, implementing both store ports
//! - `clock` - `SystemTimeSource`

mod clock;
mod memory;

pub use clock::SystemTimeSource;
pub use memory::InMemorySubmissionStore;
