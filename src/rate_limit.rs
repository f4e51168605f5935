//! Token-bucket rate limiting for outbound completion requests
//!
//! A single process-wide bucket gates every remote call. Acquisition is
//! non-blocking: a caller that finds the bucket empty gets `false` back and
//! is expected to short-circuit with a canned throttling reply instead of
//! queuing or sleeping.

use std::time::Instant;

/// Token-bucket rate limiter
///
/// Capacity equals the configured requests-per-minute; tokens refill
/// continuously at that rate, proportional to elapsed time, capped at
/// capacity. The bucket starts full.
///
/// # Examples
///
/// ```
/// use chatgate::rate_limit::RateLimiter;
///
/// let mut limiter = RateLimiter::per_minute(2);
/// assert!(limiter.try_acquire());
/// assert!(limiter.try_acquire());
/// // Bucket exhausted, no time has passed
/// assert!(!limiter.try_acquire());
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Create a bucket sized for the given requests-per-minute rate
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let capacity = f64::from(requests_per_minute);
        Self {
            capacity,
            refill_per_sec: capacity / 60.0,
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    /// Take one token if available
    ///
    /// Refills the bucket for the time elapsed since the last call, then
    /// returns `true` and consumes a token if at least one whole token is
    /// present. Never blocks.
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            tracing::debug!(
                "Rate limit hit: {:.2}/{} tokens available",
                self.tokens,
                self.capacity
            );
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }
}
