//! Polling and normalization limits.

use std::time::Duration;

use serde::Deserialize;

use crate::application::normalize::upscale::DEFAULT_PIXEL_BUDGET;
use crate::application::poll::BatchPollConfig;

/// Settings for job tracking.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Delay between batch status requests in milliseconds.
    #[serde(default = "default_batch_interval_ms")]
    pub batch_interval_ms: u64,
    /// Consecutive failed batch reads tolerated before giving up.
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    /// Largest output pixel count accepted by upscaling models.
    #[serde(default = "default_pixel_budget")]
    pub pixel_budget: u64,
}

const fn default_batch_interval_ms() -> u64 {
    1000
}

const fn default_max_retry_attempts() -> u32 {
    3
}

const fn default_pixel_budget() -> u64 {
    DEFAULT_PIXEL_BUDGET
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            batch_interval_ms: default_batch_interval_ms(),
            max_retry_attempts: default_max_retry_attempts(),
            pixel_budget: default_pixel_budget(),
        }
    }
}

impl PollingConfig {
    #[must_use]
    pub const fn batch(&self) -> BatchPollConfig {
        BatchPollConfig {
            interval: Duration::from_millis(self.batch_interval_ms),
            max_retry_attempts: self.max_retry_attempts,
        }
    }
}
