//! Utility functions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Version information for the console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Linear backoff options for reconnecting
#[derive(Debug, Clone)]
pub struct BackoffOptions {
    /// Delay unit, multiplied by the attempt number
    pub base_delay: Duration,

    /// Attempts allowed per disconnection episode
    pub max_attempts: u32,
}

impl Default for BackoffOptions {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(2000),
            max_attempts: 5,
        }
    }
}

/// Calculate the linear backoff delay for a 1-based attempt number
pub fn calc_linear_backoff(options: &BackoffOptions, attempt: u32) -> Duration {
    options.base_delay.saturating_mul(attempt)
}
