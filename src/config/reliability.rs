use std::time::Duration;

use serde::Deserialize;

use crate::retry::{DEFAULT_RETRY_INTERVAL, DEFAULT_RETRY_TIMEOUT, RetryPolicy};

/// Polling used for each `@v/list` request.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    /// Pause between attempts (milliseconds)
    #[serde(default = "RetryConfig::default_interval_ms")]
    pub interval_ms: u64,
    /// Total budget for one request including retries (seconds)
    #[serde(default = "RetryConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RetryConfig {
    fn default_interval_ms() -> u64 {
        DEFAULT_RETRY_INTERVAL.as_millis() as u64
    }

    fn default_timeout_secs() -> u64 {
        DEFAULT_RETRY_TIMEOUT.as_secs()
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.interval_ms),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval_ms: Self::default_interval_ms(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}
