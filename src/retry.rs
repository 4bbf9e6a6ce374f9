//! Retry policy with exponential backoff and failure classification.
//!
//! The policy is pure: it computes delays and decisions, and the caller
//! performs the actual sleeping. This keeps the backoff sequence directly
//! testable without timers.

use crate::config::RetryConfig;
use std::time::Duration;

/// Classification of an operation failure, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Worth retrying: transient network errors, platform rate limiting
    Transient,
    /// Never worth retrying: not found, permanently invalid
    Permanent,
    /// Must be surfaced to the bootstrap layer: authentication failure
    Fatal,
}

/// What the caller should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given duration, then make the next attempt
    RetryAfter(Duration),
    /// Abandon the operation as a skippable failure
    GiveUp,
    /// Propagate the failure upward without retrying
    Fatal,
}

/// Exponential backoff retry policy.
///
/// Attempt numbering is 1-indexed: attempt 1 runs immediately, attempt 2
/// waits `base_delay`, attempt 3 waits `base_delay * backoff_factor`, and
/// so on. After `max_attempts` failures the policy signals give-up; callers
/// must treat that as a skippable failure, never a crash.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    backoff_factor: f64,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            backoff_factor,
        }
    }

    /// Build a policy from configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            config.backoff_factor,
        )
    }

    /// Maximum number of attempts per operation.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to apply before the given 1-indexed attempt.
    ///
    /// Attempt 1 is immediate; attempt k >= 2 waits
    /// `base_delay * backoff_factor^(k-2)`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 2).min(i32::MAX as u32) as i32;
        self.base_delay.mul_f64(self.backoff_factor.powi(exponent))
    }

    /// Decide what to do after attempt `attempt` failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: FailureKind) -> RetryDecision {
        match kind {
            FailureKind::Fatal => RetryDecision::Fatal,
            FailureKind::Permanent => RetryDecision::GiveUp,
            FailureKind::Transient => {
                if attempt >= self.max_attempts {
                    RetryDecision::GiveUp
                } else {
                    RetryDecision::RetryAfter(self.delay_before(attempt + 1))
                }
            }
        }
    }
}
