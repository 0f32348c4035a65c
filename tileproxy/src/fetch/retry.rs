//! Retry policy for upstream fetches.
//!
//! Each provider configures a retry count and a base backoff; the policy
//! turns those into per-attempt delays.

use std::time::Duration;

use crate::provider::{BackoffKind, ProviderConfig};

/// Maximum delay between attempts regardless of configuration (30 seconds).
pub const DEFAULT_MAX_DELAY_SECS: u64 = 30;

/// Multiplier applied to the backoff after each failed attempt.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// How a fetch handles transient failures.
#[derive(Clone, Debug, PartialEq)]
pub enum RetryPolicy {
    /// No retries - fail immediately on error.
    None,

    /// Constant delay between attempts.
    Fixed {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay between retry attempts.
        delay: Duration,
    },

    /// Delay grows by `multiplier` after each failure, up to `max_delay`.
    ExponentialBackoff {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay after the first failure.
        initial_delay: Duration,
        /// Cap on any single delay.
        max_delay: Duration,
        /// Growth factor (typically 2.0).
        multiplier: f64,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::None
    }
}

impl RetryPolicy {
    /// Exponential backoff starting at `initial_delay`.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Maximum number of attempts (including initial)
    /// * `initial_delay` - Delay before the first retry
    pub fn exponential(max_attempts: u32, initial_delay: Duration) -> Self {
        Self::ExponentialBackoff {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Fixed delay between attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::Fixed {
            max_attempts,
            delay,
        }
    }

    /// Policy for a provider's `maxRetries` / `retryBackoff` settings.
    pub fn for_provider(provider: &ProviderConfig) -> Self {
        if provider.max_retries == 0 {
            return Self::None;
        }
        let max_attempts = provider.max_retries.saturating_add(1);
        match provider.backoff {
            BackoffKind::Fixed => Self::fixed(max_attempts, provider.retry_backoff),
            BackoffKind::Exponential => Self::exponential(max_attempts, provider.retry_backoff),
        }
    }

    /// Delay before retry number `attempt` (1-based, 1 is the first retry).
    ///
    /// Returns `None` once the attempt budget is spent.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed {
                max_attempts,
                delay,
            } => (attempt < *max_attempts).then_some(*delay),
            Self::ExponentialBackoff {
                max_attempts,
                initial_delay,
                max_delay,
                multiplier,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
                let delay_ms = (initial_delay.as_millis() as f64 * factor)
                    .min(max_delay.as_millis() as f64);
                Some(Duration::from_millis(delay_ms as u64).min(*max_delay))
            }
        }
    }

    /// Maximum number of attempts for this policy.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Fixed { max_attempts, .. } => *max_attempts,
            Self::ExponentialBackoff { max_attempts, .. } => *max_attempts,
        }
    }
}
