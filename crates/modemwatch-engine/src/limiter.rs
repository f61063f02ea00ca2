//! Sliding-window reboot limiter.
//!
//! Keeps at most `max_reboots` timestamps in a ring. A new reboot is
//! permitted while the ring has spare capacity, or once its oldest entry
//! has aged past the window. Older entries fall off on `record`.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// A reboot that the gateway acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebootEvent {
    pub at: Instant,
}

#[derive(Debug)]
pub struct RebootLimiter {
    max_reboots: u32,
    window: Duration,
    history: VecDeque<RebootEvent>,
}

impl RebootLimiter {
    pub fn new(max_reboots: u32, window: Duration) -> Self {
        Self {
            max_reboots,
            window,
            history: VecDeque::new(),
        }
    }

    /// Whether a reboot at `now` stays within the window budget.
    ///
    /// Pure: asking repeatedly without a `record` gives the same answer.
    pub fn permit(&self, now: Instant) -> bool {
        if self.max_reboots == 0 {
            return false;
        }
        if self.history.len() < self.max_reboots as usize {
            return true;
        }
        match self.history.front() {
            Some(oldest) => now.saturating_duration_since(oldest.at) > self.window,
            None => true,
        }
    }

    /// Record an executed reboot, overwriting the oldest entry when full.
    pub fn record(&mut self, now: Instant) {
        self.history.push_back(RebootEvent { at: now });
        while self.history.len() > self.max_reboots as usize {
            self.history.pop_front();
        }
    }

    /// Number of reboots still tracked.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Reboots recorded within the window ending at `now`.
    pub fn recent(&self, now: Instant) -> usize {
        self.history
            .iter()
            .filter(|e| now.saturating_duration_since(e.at) <= self.window)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn permits_until_capacity_is_reached() {
        let t0 = Instant::now();
        let mut limiter = RebootLimiter::new(2, secs(3600));

        assert!(limiter.permit(t0));
        limiter.record(t0);
        assert!(limiter.permit(t0 + secs(60)));
        limiter.record(t0 + secs(60));

        assert!(!limiter.permit(t0 + secs(120)));
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn permits_again_once_oldest_leaves_window() {
        let t0 = Instant::now();
        let mut limiter = RebootLimiter::new(2, secs(3600));
        limiter.record(t0);
        limiter.record(t0 + secs(600));

        // Exactly at the window edge the oldest reboot still counts.
        assert!(!limiter.permit(t0 + secs(3600)));
        assert!(limiter.permit(t0 + secs(3601)));

        limiter.record(t0 + secs(3601));
        // The ring now holds t0+600 and t0+3601.
        assert_eq!(limiter.len(), 2);
        assert!(!limiter.permit(t0 + secs(4000)));
        assert!(limiter.permit(t0 + secs(4201)));
    }

    #[test]
    fn zero_budget_never_permits() {
        let t0 = Instant::now();
        let mut limiter = RebootLimiter::new(0, secs(60));
        assert!(!limiter.permit(t0));
        limiter.record(t0);
        assert!(limiter.is_empty());
        assert!(!limiter.permit(t0 + secs(3600)));
    }

    #[test]
    fn huge_budget_does_not_preallocate() {
        let t0 = Instant::now();
        let mut limiter = RebootLimiter::new(u32::MAX, secs(3600));
        assert!(limiter.permit(t0));
        limiter.record(t0);
        assert!(limiter.permit(t0 + secs(1)));
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn permit_is_idempotent() {
        let t0 = Instant::now();
        let mut limiter = RebootLimiter::new(1, secs(100));
        limiter.record(t0);

        let now = t0 + secs(50);
        let first = limiter.permit(now);
        for _ in 0..10 {
            assert_eq!(limiter.permit(now), first);
        }
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn recent_counts_only_entries_inside_window() {
        let t0 = Instant::now();
        let mut limiter = RebootLimiter::new(3, secs(100));
        limiter.record(t0);
        limiter.record(t0 + secs(50));
        limiter.record(t0 + secs(90));

        assert_eq!(limiter.recent(t0 + secs(95)), 3);
        assert_eq!(limiter.recent(t0 + secs(120)), 2);
        assert_eq!(limiter.recent(t0 + secs(500)), 0);
    }

    #[test]
    fn never_exceeds_budget_in_any_window() {
        // Reboot whenever permitted over a long, irregular schedule and
        // check every trailing window against the budget.
        let t0 = Instant::now();
        let max = 3u32;
        let window = secs(1000);
        let mut limiter = RebootLimiter::new(max, window);
        let mut executed: Vec<Instant> = Vec::new();

        let mut offset = 0u64;
        for step in 0..500u64 {
            offset += 7 + (step * 37) % 113;
            let now = t0 + secs(offset);
            if limiter.permit(now) {
                limiter.record(now);
                executed.push(now);
            }
        }

        assert!(executed.len() > max as usize);
        for (i, end) in executed.iter().enumerate() {
            let in_window = executed[..=i]
                .iter()
                .filter(|t| end.saturating_duration_since(**t) <= window)
                .count();
            assert!(in_window <= max as usize, "window ending at #{i} holds {in_window}");
        }
    }
}
