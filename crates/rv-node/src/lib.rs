//! # RefVerify Node
//!
//! Assembles the submission lifecycle (rv-01), realtime notifications
//! (rv-02) and the API gateway (rv-03) around one in-memory event bus.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file, then `RV_*` environment overrides)
//! 2. Build the bus, lifecycle service, connection registry and gateway
//! 3. Subscribe the fan-out to the bus and spawn it
//! 4. Bind the listener and serve until Ctrl+C

pub mod config;
pub mod runtime;

pub use config::{load_config, BusConfig, NodeConfig};
pub use runtime::{NodeRuntime, RunningNode};
