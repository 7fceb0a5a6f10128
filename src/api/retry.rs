//! Retry policy with exponential backoff for remote API calls.
//!
//! Every failure of an API call is treated as transient: network errors,
//! non-success statuses and undecodable bodies are all retried until the
//! attempt budget runs out, after which the last error is propagated.
//!
//! # Example
//!
//! ```
//! use commons_sampler::api::{RetryDecision, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::default();
//! match policy.should_retry(1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_secs(1));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { reason } => panic!("{reason}"),
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

/// Default maximum attempts (including the first one).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay for exponential backoff (1 second).
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default backoff multiplier (doubles each attempt).
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Decision on whether to retry a failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the call after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry; the failure is final.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Delay Calculation
///
/// ```text
/// delay = base_delay * multiplier^(attempt - 1)
/// ```
///
/// With defaults, delays are 1s, 2s, 4s, 8s. No jitter, no cap.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Delay before the first retry.
    base_delay: Duration,

    /// Multiplier applied each attempt.
    backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom settings.
    ///
    /// `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            backoff_multiplier,
        }
    }

    /// Creates a policy with a custom `max_attempts`, using defaults for other settings.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Determines whether to retry after `attempt` (1-indexed) failed.
    #[instrument(level = "trace", skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: self.delay_after(attempt),
            attempt: attempt + 1,
        }
    }

    /// Delay slept after failed attempt `attempt` (1-indexed).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(self.base_delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }
}
