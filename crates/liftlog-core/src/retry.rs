//! # Retry Policy
//!
//! Backoff arithmetic for automatic sync retries.
//!
//! ## Schedule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               Exponential Backoff (base = 30s, max = 5)                 │
//! │                                                                         │
//! │  failure #1 ──► wait 2^0 × 30s =  30s                                   │
//! │  failure #2 ──► wait 2^1 × 30s =  60s                                   │
//! │  failure #3 ──► wait 2^2 × 30s = 120s                                   │
//! │  failure #4 ──► wait 2^3 × 30s = 240s                                   │
//! │  failure #5 ──► exhausted, manual retry only                            │
//! │                                                                         │
//! │  No jitter: the schedule is exact so consumers can show a countdown.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

/// Default number of consecutive failures before automatic retries stop.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default seed for the exponential backoff.
pub const DEFAULT_BASE_RETRY_DELAY: Duration = Duration::from_millis(30_000);

/// What the engine should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Arm a timer and try again after `delay`. `attempt` is the new
    /// consecutive failure count.
    Retry { attempt: u32, delay: Duration },

    /// Stop retrying automatically.
    Exhausted { attempts: u32 },
}

/// Retry configuration for a synced-save engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Stop scheduling automatic retries once this many consecutive
    /// failures have happened.
    pub max_retries: u32,

    /// Delay before the first automatic retry.
    pub base_retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: DEFAULT_MAX_RETRIES,
            base_retry_delay: DEFAULT_BASE_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(max_retries: u32, base_retry_delay: Duration) -> Self {
        RetryPolicy {
            max_retries,
            base_retry_delay,
        }
    }

    /// Delay after `prior_failures` earlier consecutive failures:
    /// `2^prior_failures × base`. Saturates instead of overflowing.
    pub fn delay_for(&self, prior_failures: u32) -> Duration {
        2u32.checked_pow(prior_failures)
            .and_then(|factor| self.base_retry_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Decides what follows a failure when `prior_failures` consecutive
    /// failures had already been counted.
    pub fn decide(&self, prior_failures: u32) -> RetryDecision {
        let attempt = prior_failures.saturating_add(1);

        if attempt >= self.max_retries {
            RetryDecision::Exhausted {
                attempts: self.max_retries,
            }
        } else {
            RetryDecision::Retry {
                attempt,
                delay: self.delay_for(prior_failures),
            }
        }
    }

    /// Returns true once automatic retries have stopped.
    pub fn is_exhausted(&self, retry_count: u32) -> bool {
        retry_count >= self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_retry_delay, Duration::from_secs(30));
    }

    #[test]
    fn test_delays_double_and_strictly_increase() {
        let policy = RetryPolicy::new(5, Duration::from_millis(1000));
        let delays: Vec<_> = (0..4).map(|n| policy.delay_for(n)).collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_decide_stops_at_max_retries() {
        let policy = RetryPolicy::new(3, Duration::from_secs(10));

        assert_eq!(
            policy.decide(0),
            RetryDecision::Retry {
                attempt: 1,
                delay: Duration::from_secs(10)
            }
        );
        assert_eq!(
            policy.decide(1),
            RetryDecision::Retry {
                attempt: 2,
                delay: Duration::from_secs(20)
            }
        );
        assert_eq!(policy.decide(2), RetryDecision::Exhausted { attempts: 3 });
        assert!(policy.is_exhausted(3));
        assert!(!policy.is_exhausted(2));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(64), Duration::MAX);
    }
}
