//! Lifecycle limits.

use serde::{Deserialize, Serialize};

/// Hard ceiling on batch size regardless of configuration.
pub const MAX_BATCH_SIZE_CEILING: usize = 10_000;

/// Limits enforced by the lifecycle service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Maximum ids accepted by one batch transition.
    pub max_batch_size: usize,
    /// Maximum verifier notes length, in characters.
    pub max_notes_len: usize,
    /// Maximum title length, in characters.
    pub max_title_len: usize,
    /// Maximum publisher length, in characters.
    pub max_publisher_len: usize,
    /// Maximum url length, in bytes.
    pub max_url_len: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            max_notes_len: 2000,
            max_title_len: 300,
            max_publisher_len: 200,
            max_url_len: 2048,
        }
    }
}

impl LifecycleConfig {
    /// Check the limits are usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_batch_size == 0 || self.max_batch_size > MAX_BATCH_SIZE_CEILING {
            return Err(format!(
                "max_batch_size must be between 1 and {}",
                MAX_BATCH_SIZE_CEILING
            ));
        }
        if self.max_notes_len == 0 || self.max_title_len == 0 || self.max_publisher_len == 0 {
            return Err("text limits must be greater than zero".into());
        }
        if self.max_url_len < 16 {
            return Err("max_url_len must be at least 16".into());
        }
        Ok(())
    }
}
