//! Adaptive probe cadence.
//!
//! While targets keep answering the probe interval widens; right after a
//! fully failed cycle it narrows again so recovery is noticed quickly.

use std::time::Duration;

use tracing::debug;

/// Fastest probe cadence.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);
/// Slowest probe cadence.
pub const MAX_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct PollState {
    current_interval: Duration,
    consecutive_successes: u32,
    /// Successes needed before the interval starts to widen.
    widen_after: u32,
}

impl PollState {
    pub fn new(initial: Duration, widen_after: u32) -> Self {
        Self {
            current_interval: initial.max(MIN_INTERVAL),
            consecutive_successes: 0,
            widen_after: widen_after.max(1),
        }
    }

    /// Record a successful cycle and return the next interval.
    ///
    /// Below `widen_after` successes the interval halves (floor 1s),
    /// from then on it doubles (cap 60s).
    pub fn on_success(&mut self) -> Duration {
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        let secs = self.current_interval.as_secs();
        let next = if self.consecutive_successes >= self.widen_after {
            Duration::from_secs(secs.saturating_mul(2)).min(MAX_INTERVAL)
        } else {
            Duration::from_secs(secs / 2).max(MIN_INTERVAL)
        };
        if next != self.current_interval {
            debug!(
                from_secs = secs,
                to_secs = next.as_secs(),
                successes = self.consecutive_successes,
                "probe interval adjusted"
            );
        }
        self.current_interval = next;
        next
    }

    /// Record a cycle in which every target failed.
    pub fn on_failure(&mut self) {
        self.consecutive_successes = 0;
    }

    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes
    }
}
