//! Retry and backoff policy for page requests.
//!
//! The policy is pure: given the fault of a failed attempt it returns what
//! to do next. The fetcher in `bundle-fetch` performs the actual sleeping.
//!
//! | Fault          | Wait before next attempt     |
//! |----------------|------------------------------|
//! | Rate limited   | `base_delay * attempt * 2`   |
//! | Server (5xx)   | `base_delay * attempt`       |
//! | Transport      | `base_delay * attempt`       |
//! | Client (4xx)   | never retried                |
//!
//! All classes share one attempt counter.

use std::time::Duration;

use bundle_types::PageError;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then try again.
    RetryAfter(Duration),
    /// Surface the error to the caller.
    Fail,
}

/// Bounded per-request retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Total attempts allowed per request, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Base delay the per-class multipliers apply to.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Decide what follows failed attempt number `attempt` (1-based).
    ///
    /// No wait is scheduled after the final attempt: the error is
    /// surfaced immediately.
    pub fn decide(&self, error: &PageError, attempt: u32) -> RetryDecision {
        if !error.is_retryable() || attempt >= self.max_attempts {
            return RetryDecision::Fail;
        }
        RetryDecision::RetryAfter(self.delay_for(error, attempt))
    }

    /// The wait a retryable fault earns after attempt `attempt`.
    pub fn delay_for(&self, error: &PageError, attempt: u32) -> Duration {
        let multiplier = match error {
            PageError::RateLimited { .. } => attempt.saturating_mul(2),
            PageError::Server { .. } | PageError::Transport(_) => attempt,
            PageError::Client { .. } => 0,
        };
        self.base_delay.saturating_mul(multiplier)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(2))
    }

    #[test]
    fn server_errors_back_off_linearly() {
        let err = PageError::Server { status: 500 };
        assert_eq!(
            policy().decide(&err, 1),
            RetryDecision::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(
            policy().decide(&err, 2),
            RetryDecision::RetryAfter(Duration::from_secs(4))
        );
    }

    #[test]
    fn rate_limit_waits_twice_as_long() {
        let err = PageError::RateLimited { status: 429 };
        assert_eq!(
            policy().decide(&err, 1),
            RetryDecision::RetryAfter(Duration::from_secs(4))
        );
        assert_eq!(
            policy().decide(&err, 2),
            RetryDecision::RetryAfter(Duration::from_secs(8))
        );
    }

    #[test]
    fn transport_errors_back_off_linearly() {
        let err = PageError::Transport("connection reset".into());
        assert_eq!(policy().delay_for(&err, 3), Duration::from_secs(6));
    }

    #[test]
    fn client_errors_fail_immediately() {
        let err = PageError::Client { status: 404 };
        assert_eq!(policy().decide(&err, 1), RetryDecision::Fail);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let err = PageError::Transport("timeout".into());
        assert!(matches!(policy().decide(&err, 2), RetryDecision::RetryAfter(_)));
        assert_eq!(policy().decide(&err, 3), RetryDecision::Fail);
        assert_eq!(policy().decide(&err, 4), RetryDecision::Fail);
    }

    #[test]
    fn zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(
            policy.decide(&PageError::Server { status: 503 }, 1),
            RetryDecision::Fail
        );
    }

    #[test]
    fn default_matches_upstream_tuning() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.base_delay(), Duration::from_secs(2));
    }
}
