//! Retry policy applied by the view state controller between attempts.

use std::time::Duration;

use crate::error::LookupError;

/// Status that is never retried: the user does not exist.
const TERMINAL_STATUS: u16 = 404;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Same retry budget, no waiting between attempts.
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_max_retries(self, max_retries: u32) -> Self {
        Self { max_retries, ..self }
    }

    /// `attempt` is the 1-based number of the attempt that just failed.
    pub fn should_retry(&self, attempt: u32, error: &LookupError) -> bool {
        if error.status() == Some(TERMINAL_STATUS) {
            return false;
        }
        attempt <= self.max_retries
    }

    /// Wait before the attempt following `attempt`: doubles each time, capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}
