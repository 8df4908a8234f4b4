//! Refresh timing configuration.

use std::time::Duration;

/// Configuration for the refresh scheduler.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between periodic refreshes.
    pub interval: Duration,

    /// Pause before the single retry of a failed fetch.
    pub retry_delay: Duration,
}

impl RefreshConfig {
    /// Create a new configuration with the given timings.
    pub fn new(interval: Duration, retry_delay: Duration) -> Self {
        Self {
            interval,
            retry_delay,
        }
    }

    /// Set the periodic interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the retry delay.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15 * 60), // 15 minutes
            retry_delay: Duration::from_secs(5),
        }
    }
}
