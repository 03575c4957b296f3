//! Instance configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Static configuration for one orchestrator instance, read once at start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Timeout for a single fetch call, in seconds.
    pub fetch_timeout_secs: u64,
    /// Timeout for a single destination sync call, in seconds.
    pub sync_timeout_secs: u64,
    /// How long to wait in `Draining` before polling again, in seconds.
    pub poll_interval_secs: u64,
    /// Records requested per page.
    pub batch_size: u32,
    /// Fixed cooldown applied on a rate-limit condition, in seconds.
    pub rate_limit_cooldown_secs: u64,
    /// Bound on consecutive rate-limit waits for one step.
    ///
    /// `None` waits indefinitely, matching the uncounted cooldown-and-retry
    /// behavior. `Some(n)` turns the `n+1`-th consecutive cooldown into a
    /// terminal failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rate_limit_waits: Option<u32>,
    /// Retry policy for counted failures.
    pub retry: RetryPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 30,
            sync_timeout_secs: 60,
            poll_interval_secs: 60,
            batch_size: 100,
            rate_limit_cooldown_secs: 60,
            max_rate_limit_waits: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl SyncSettings {
    /// Get the fetch timeout as a `Duration`.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Get the sync timeout as a `Duration`.
    #[must_use]
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    /// Get the poll interval as a `Duration`.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Get the rate-limit cooldown as a `Duration`.
    #[must_use]
    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_secs < 1 {
            return Err("Poll interval must be at least 1 second".to_string());
        }
        if self.batch_size < 1 || self.batch_size > 10_000 {
            return Err("Batch size must be between 1 and 10000".to_string());
        }
        if self.retry.max_attempts < 1 {
            return Err("Retry policy must allow at least 1 attempt".to_string());
        }
        if self.retry.backoff_coefficient < 1.0 {
            return Err("Backoff coefficient must be at least 1.0".to_string());
        }
        Ok(())
    }
}
