//! Minimum-interval rate limiting for outbound platform calls.
//!
//! A single lock covers both the wait decision and the timestamp update, so
//! two near-simultaneous callers can never both conclude they are first.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Enforces a minimum spacing between consecutive calls.
///
/// Built on [`tokio::time`], so tests can drive it deterministically with
/// paused time. `wait_if_needed` is cancel-safe: a caller dropped mid-wait
/// leaves the limiter state untouched.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_call: Option<Instant>,
    call_count: u64,
    total_wait: Duration,
}

/// Counters describing rate limiter activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterStats {
    /// Calls that have passed through the limiter
    pub call_count: u64,
    /// When the most recent call was released
    pub last_call: Option<Instant>,
    /// Cumulative time spent waiting
    pub total_wait: Duration,
}

impl RateLimiter {
    /// Create a limiter enforcing `min_interval` between calls.
    ///
    /// A zero interval disables throttling entirely.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Suspend until at least the minimum interval has elapsed since the
    /// previous call returned, then record this call.
    ///
    /// The lock is held across the sleep: concurrent callers queue up and
    /// each observes the timestamp written by its predecessor.
    pub async fn wait_if_needed(&self) {
        let mut inner = self.inner.lock().await;

        if !self.min_interval.is_zero() {
            if let Some(last_call) = inner.last_call {
                let elapsed = last_call.elapsed();
                if elapsed < self.min_interval {
                    let wait = self.min_interval - elapsed;
                    debug!(wait_ms = wait.as_millis() as u64, "rate limiting platform call");
                    tokio::time::sleep(wait).await;
                    inner.total_wait += wait;
                }
            }
        }

        inner.last_call = Some(Instant::now());
        inner.call_count += 1;
    }

    /// Current activity counters.
    pub async fn statistics(&self) -> RateLimiterStats {
        let inner = self.inner.lock().await;
        RateLimiterStats {
            call_count: inner.call_count,
            last_call: inner.last_call,
            total_wait: inner.total_wait,
        }
    }
}
