//! Retry policy with exponential backoff for failed transfer attempts.
//!
//! Every attempt failure (transport error, unexpected status, short file) is
//! retried until the attempt cap is reached. The wait after failed attempt
//! `n` is `base_delay * 2^(n-1)`.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use index_downloader::download::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(2));
//! match policy.should_retry(1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_secs(2));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { .. } => unreachable!(),
//! }
//! ```

use std::time::Duration;

use tracing::debug;

use crate::config::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number comes next (1-indexed).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Attempt cap and backoff base for one resource.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Delay after the first failed attempt.
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff base delay.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Determines whether to retry after `attempt` (1-indexed) failed.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: self.delay_for(attempt),
            attempt: attempt + 1,
        }
    }

    /// Backoff after failed attempt `attempt`: `base_delay * 2^(attempt-1)`.
    ///
    /// Saturates instead of overflowing for very large attempt numbers.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 2u32.checked_pow(exponent).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Sum of every backoff a resource failing `failures` times would wait.
    #[must_use]
    pub fn total_backoff(&self, failures: u32) -> Duration {
        (1..=failures).fold(Duration::ZERO, |acc, attempt| {
            acc.saturating_add(self.delay_for(attempt))
        })
    }
}
