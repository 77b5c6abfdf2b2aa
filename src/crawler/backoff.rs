//! Retry budget and exponential backoff for page fetches

use crate::config::RetryConfig;
use crate::crawler::fetcher::FetchErrorKind;
use std::time::Duration;

/// Per-page retry policy
///
/// The delay before retry `n` (1-based) is `base * 2^(n-1)`, multiplied again
/// by the blocked multiplier after an anti-automation block, and never more
/// than `max_delay`.
#[derive(Debug, Clone)]
pub struct Backoff {
    base_delay: Duration,
    max_delay: Duration,
    blocked_multiplier: u32,
    max_attempts: u32,
}

impl Backoff {
    pub fn new(
        base_delay: Duration,
        max_delay: Duration,
        blocked_multiplier: u32,
        max_attempts: u32,
    ) -> Self {
        Self {
            base_delay,
            max_delay,
            blocked_multiplier: blocked_multiplier.max(1),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.blocked_multiplier,
            config.max_attempts,
        )
    }

    /// Attempts allowed per page, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// True while another attempt fits in the budget after `attempt` failed
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait after failed attempt number `attempt`
    pub fn delay_for(&self, attempt: u32, kind: FetchErrorKind) -> Duration {
        let doubling = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        let mut delay = self.base_delay.saturating_mul(doubling);

        if kind == FetchErrorKind::Blocked {
            delay = delay.saturating_mul(self.blocked_multiplier);
        }

        delay.min(self.max_delay)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
