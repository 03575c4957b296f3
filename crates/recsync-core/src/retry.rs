//! Retry policy engine.
//!
//! Stateless classification and backoff computation. The orchestrator asks
//! three questions here: what disposition does a failure have, how long to
//! wait before the next attempt, and whether any attempts remain.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::ErrorKind;

/// How the orchestrator should react to a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Wait the fixed cooldown and retry the same step, uncounted.
    RateLimit,
    /// Stop immediately; retrying cannot help.
    NonRetryable,
    /// Retry with backoff, counted against `max_attempts`.
    Retryable,
}

/// Immutable retry configuration, loaded once per instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the first retry, in milliseconds.
    pub initial_interval_ms: u64,
    /// Multiplier applied per attempt.
    pub backoff_coefficient: f64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_interval_ms: u64,
    /// Maximum attempts per step before the failure becomes terminal.
    pub max_attempts: u32,
    /// Kinds that are never retried.
    pub non_retryable_kinds: HashSet<ErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval_ms: 1_000,
            backoff_coefficient: 2.0,
            max_interval_ms: 60_000,
            max_attempts: 5,
            non_retryable_kinds: HashSet::from([ErrorKind::AuthError, ErrorKind::InvalidInput]),
        }
    }
}

impl RetryPolicy {
    /// Delay before the first retry.
    #[must_use]
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    /// Upper bound on any single delay.
    #[must_use]
    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    /// Classify a failure kind into a disposition.
    ///
    /// Rate limits are special-cased ahead of the non-retryable set; unknown
    /// kinds default to retryable.
    #[must_use]
    pub fn classify(&self, kind: ErrorKind) -> Disposition {
        if kind == ErrorKind::RateLimit {
            Disposition::RateLimit
        } else if self.non_retryable_kinds.contains(&kind) {
            Disposition::NonRetryable
        } else {
            Disposition::Retryable
        }
    }

    /// Compute the backoff delay for a given attempt (0-indexed).
    ///
    /// `min(initial_interval * backoff_coefficient^attempt, max_interval)`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.initial_interval_ms as f64 * self.backoff_coefficient.powi(attempt as i32);
        let capped = base.min(self.max_interval_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Whether another attempt remains after `attempts_made` failures.
    #[must_use]
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}
