//! # Domain Layer
//!
//! Pure lifecycle logic. Nothing in here performs I/O.
//!
//! - `entities` - Actions, audit entries, filters, statistics
//! - `transition` - The transition engine
//! - `validation` - Input normalization for create, notes and batches
//! - `config` - Lifecycle limits
//! - `errors` - Domain and store error types

pub mod config;
pub mod entities;
pub mod errors;
pub mod transition;
pub mod validation;
