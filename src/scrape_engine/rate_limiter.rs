//! Global request rate limiter
//!
//! Every outbound fetch of a run passes through one `RateLimiter`. The
//! bucket refills one permit per `interval` and holds at most `burst`
//! permits; with the default burst of 1 it enforces a strict minimum spacing
//! between requests regardless of how many units are waiting.
//!
//! Key features:
//! - Lock-free bucket state: a single atomic "theoretical arrival time"
//!   updated with compare-and-swap (the virtual-scheduling form of a token
//!   bucket)
//! - Immediate Allow/Deny decisions via [`RateLimiter::try_acquire`]
//! - Cancellable waiting via [`RateLimiter::acquire`]
//! - Scoped to one run: limiters are constructed explicitly and shared by `Arc`

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::scrape_types::{ScrapeError, ScrapeResult};

/// Rate limit decision for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request is allowed to proceed
    Allow,
    /// Request must wait; contains the duration until a permit is available
    Deny { retry_after: Duration },
}

/// Token bucket shared by all concurrent units of a run
#[derive(Debug)]
pub struct RateLimiter {
    /// Reference point for all nanosecond timestamps of this limiter
    base: Instant,
    /// Earliest time, in nanoseconds since `base`, at which the bucket is
    /// empty again once the next permit is taken
    tat_nanos: AtomicU64,
    interval_nanos: u64,
    /// How far ahead of `tat` a permit may be granted: `interval * (burst - 1)`
    tolerance_nanos: u64,
    interval: Duration,
    burst: u32,
}

impl RateLimiter {
    /// Create a limiter admitting one permit per `interval` with `burst` capacity
    ///
    /// A zero interval disables limiting. A burst of 0 is treated as 1.
    #[must_use]
    pub fn new(interval: Duration, burst: u32) -> Self {
        let burst = burst.max(1);
        let interval_nanos = u64::try_from(interval.as_nanos()).unwrap_or(u64::MAX);
        Self {
            base: Instant::now(),
            tat_nanos: AtomicU64::new(0),
            interval_nanos,
            tolerance_nanos: interval_nanos.saturating_mul(u64::from(burst - 1)),
            interval,
            burst,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn burst(&self) -> u32 {
        self.burst
    }

    #[inline]
    fn now_nanos(&self) -> u64 {
        u64::try_from(self.base.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    /// Take a permit at `now_nanos` if one is available
    #[inline]
    fn consume_at(&self, now_nanos: u64) -> RateLimitDecision {
        self.consume_with(|| now_nanos).0
    }

    /// Take a permit if one is available at the time `clock` reports
    ///
    /// The clock is read again on every compare-and-swap attempt, so the
    /// returned timestamp is the one the winning swap committed to.
    #[inline]
    fn consume_with(&self, clock: impl Fn() -> u64) -> (RateLimitDecision, u64) {
        if self.interval_nanos == 0 {
            return (RateLimitDecision::Allow, clock());
        }

        loop {
            let tat = self.tat_nanos.load(Ordering::Acquire);
            let now_nanos = clock();
            let earliest = tat.saturating_sub(self.tolerance_nanos);
            if now_nanos < earliest {
                let retry_after = Duration::from_nanos(earliest - now_nanos);
                return (RateLimitDecision::Deny { retry_after }, now_nanos);
            }

            let new_tat = tat.max(now_nanos).saturating_add(self.interval_nanos);
            match self.tat_nanos.compare_exchange_weak(
                tat,
                new_tat,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return (RateLimitDecision::Allow, now_nanos),
                Err(_) => continue, // Retry on contention with a fresh reading
            }
        }
    }

    /// Attempt to take a permit without waiting
    #[inline]
    pub fn try_acquire(&self) -> RateLimitDecision {
        self.consume_with(|| self.now_nanos()).0
    }

    /// Wait for a permit
    ///
    /// Returns the instant at which the permit was granted: the clock reading
    /// the bucket state was advanced from. Grants are never closer together
    /// than `interval` once the burst is spent.
    ///
    /// # Errors
    /// Returns `ScrapeError::Cancelled` if `cancel` fires before a permit is
    /// granted.
    pub async fn acquire(&self, cancel: &CancellationToken) -> ScrapeResult<Instant> {
        loop {
            if cancel.is_cancelled() {
                return Err(ScrapeError::Cancelled);
            }

            match self.consume_with(|| self.now_nanos()) {
                (RateLimitDecision::Allow, granted_nanos) => {
                    return Ok(self.base + Duration::from_nanos(granted_nanos));
                }
                (RateLimitDecision::Deny { retry_after }, _) => {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(ScrapeError::Cancelled),
                        () = tokio::time::sleep(retry_after) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_permit_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_millis(50), 1);
        assert_eq!(limiter.try_acquire(), RateLimitDecision::Allow);
        assert!(matches!(
            limiter.try_acquire(),
            RateLimitDecision::Deny { .. }
        ));
    }

    #[test]
    fn test_deny_reports_remaining_wait() {
        let limiter = RateLimiter::new(Duration::from_millis(50), 1);
        assert_eq!(limiter.consume_at(0), RateLimitDecision::Allow);
        assert_eq!(
            limiter.consume_at(20_000_000),
            RateLimitDecision::Deny {
                retry_after: Duration::from_millis(30)
            }
        );
        assert_eq!(limiter.consume_at(50_000_000), RateLimitDecision::Allow);
    }

    #[test]
    fn test_burst_capacity() {
        let limiter = RateLimiter::new(Duration::from_millis(50), 3);
        assert_eq!(limiter.consume_at(0), RateLimitDecision::Allow);
        assert_eq!(limiter.consume_at(0), RateLimitDecision::Allow);
        assert_eq!(limiter.consume_at(0), RateLimitDecision::Allow);
        assert!(matches!(
            limiter.consume_at(0),
            RateLimitDecision::Deny { .. }
        ));
        // One interval later exactly one permit has refilled
        assert_eq!(limiter.consume_at(50_000_000), RateLimitDecision::Allow);
        assert!(matches!(
            limiter.consume_at(50_000_000),
            RateLimitDecision::Deny { .. }
        ));
    }

    #[test]
    fn test_idle_time_does_not_bank_beyond_burst() {
        let limiter = RateLimiter::new(Duration::from_millis(50), 1);
        assert_eq!(limiter.consume_at(0), RateLimitDecision::Allow);
        assert_eq!(limiter.consume_at(10_000_000_000), RateLimitDecision::Allow);
        assert!(matches!(
            limiter.consume_at(10_000_000_001),
            RateLimitDecision::Deny { .. }
        ));
    }

    #[test]
    fn test_zero_interval_disables_limiting() {
        let limiter = RateLimiter::new(Duration::ZERO, 1);
        for _ in 0..100 {
            assert_eq!(limiter.try_acquire(), RateLimitDecision::Allow);
        }
    }

    #[test]
    fn test_contended_grant_uses_fresh_clock_reading() {
        use std::cell::Cell;

        let limiter = RateLimiter::new(Duration::from_millis(50), 1);
        let calls = Cell::new(0u64);
        let last = Cell::new(0u64);

        let (decision, granted) = limiter.consume_with(|| {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                // Another unit commits a grant between our load and swap
                limiter.tat_nanos.store(50_000_000, Ordering::Release);
                last.set(10_000_000);
            } else {
                last.set(60_000_000 + calls.get());
            }
            last.get()
        });

        assert_eq!(decision, RateLimitDecision::Allow);
        assert!(calls.get() >= 2);
        assert_eq!(granted, last.get());
        assert_eq!(
            limiter.tat_nanos.load(Ordering::Acquire),
            granted + 50_000_000
        );
    }
}
