//! Retry policy for failed actions.

use std::time::Duration;

/// Upper bound for the delay between retries.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(15);

/// Exponential backoff state for one scheduled action.
///
/// Starts at the delay the action was armed with. A zero delay backs off
/// to one second; anything else doubles, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the next execution.
    current_delay: Duration,
    /// Maximum backoff.
    max_delay: Duration,
    /// Failed executions so far.
    failures: u32,
}

impl RetryPolicy {
    pub fn new(initial_delay: Duration) -> Self {
        Self {
            current_delay: initial_delay,
            max_delay: MAX_RETRY_DELAY,
            failures: 0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// The delay that would follow a failure, without recording one.
    pub fn next_delay(&self) -> Duration {
        if self.current_delay.is_zero() {
            Duration::from_secs(1)
        } else {
            self.current_delay.saturating_mul(2).min(self.max_delay)
        }
    }

    /// Record a failure and return the delay before the retry.
    pub fn backoff(&mut self) -> Duration {
        self.current_delay = self.next_delay();
        self.failures += 1;
        self.current_delay
    }
}
