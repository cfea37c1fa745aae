/// Exponential backoff for transient RPC failures while polling
/// Tracks consecutive failures and caps the wait at a configured maximum

use std::time::Duration;
use tracing::{info, warn};

/// Exponential backoff state tracker
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base_interval: Duration,
    max_interval: Duration,
    current_attempt: u32,
    current_interval: Duration,
}

impl ExponentialBackoff {
    /// Create new backoff handler
    pub fn new(base_interval: Duration, max_interval: Duration) -> Self {
        ExponentialBackoff {
            base_interval,
            max_interval,
            current_attempt: 0,
            current_interval: base_interval,
        }
    }

    /// Record a failure and return the backoff duration
    pub fn on_failure(&mut self, error_message: &str) -> Duration {
        self.current_attempt += 1;

        // base * 2^(attempts - 1)
        let factor = 2_u32.saturating_pow(self.current_attempt.saturating_sub(1));
        let next_interval = self.base_interval.saturating_mul(factor);

        self.current_interval = next_interval.min(self.max_interval);

        warn!(
            attempt = self.current_attempt,
            interval_ms = self.current_interval.as_millis() as u64,
            error = error_message,
            "RPC failure: backing off before retry"
        );

        self.current_interval
    }

    /// Reset backoff on successful operation
    pub fn on_success(&mut self) {
        if self.current_attempt > 0 {
            info!(
                attempts = self.current_attempt,
                "RPC recovered after {} attempts, resetting backoff",
                self.current_attempt
            );
        }
        self.current_attempt = 0;
        self.current_interval = self.base_interval;
    }

    /// Get current number of consecutive failures
    pub fn attempts(&self) -> u32 {
        self.current_attempt
    }

    pub fn interval(&self) -> Duration {
        self.current_interval
    }

    /// Check if the retry budget is exhausted
    pub fn should_give_up(&self, max_total_attempts: u32) -> bool {
        self.current_attempt >= max_total_attempts
    }
}
