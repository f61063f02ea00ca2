//! Settling-wait backoff.
//!
//! The multiplier doubles after every executed reboot and is capped at 15,
//! so the progression is 1 → 2 → 4 → 8 → 15. Any cycle where a target
//! answers resets it to 1.

use std::time::Duration;

use tracing::debug;

/// Upper bound for the settling multiplier.
pub const MAX_MULTIPLIER: u32 = 15;

#[derive(Debug)]
pub struct BackoffController {
    multiplier: u32,
}

impl Default for BackoffController {
    fn default() -> Self {
        Self::new()
    }
}

impl BackoffController {
    pub fn new() -> Self {
        Self { multiplier: 1 }
    }

    /// Double the multiplier after a reboot and return the new value.
    pub fn on_reboot(&mut self) -> u32 {
        self.multiplier = (self.multiplier * 2).min(MAX_MULTIPLIER);
        debug!(multiplier = self.multiplier, "settling backoff increased");
        self.multiplier
    }

    pub fn on_success(&mut self) {
        if self.multiplier != 1 {
            debug!(previous = self.multiplier, "settling backoff reset");
        }
        self.multiplier = 1;
    }

    /// Settling wait for the given base: `base * multiplier`.
    pub fn current_wait(&self, base: Duration) -> Duration {
        base * self.multiplier
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }
}
