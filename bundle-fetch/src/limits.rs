//! Outbound request rate limiting.
//!
//! All page requests of a run share one direct (non-keyed) governor
//! limiter, so concurrent endpoint fetches cannot exceed the configured
//! aggregate rate against the upstream.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Type alias for a direct (non-keyed) rate limiter.
type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared limiter for outbound page requests.
#[derive(Clone)]
pub struct RequestLimiter {
    limiter: Arc<DirectLimiter>,
    per_second: NonZeroU32,
}

impl std::fmt::Debug for RequestLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLimiter")
            .field("limiter", &"DirectLimiter")
            .field("per_second", &self.per_second)
            .finish()
    }
}

impl RequestLimiter {
    /// Create a limiter allowing `per_second` requests per second.
    ///
    /// Zero is treated as one; configuration validation rejects it earlier.
    pub fn new(per_second: u32) -> Self {
        let per_second = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
            per_second,
        }
    }

    /// Configured requests per second.
    pub fn per_second(&self) -> u32 {
        self.per_second.get()
    }

    /// Wait until one more request is allowed.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Take a permit without waiting. Returns `false` when rate limited.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}
