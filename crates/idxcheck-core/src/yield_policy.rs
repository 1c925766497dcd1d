//! Cooperative yield cadence for scan drivers.
//!
//! The checker never suspends. A driver wraps its observation loop with a
//! [`YieldTracker`] and releases storage-engine resources whenever `tick`
//! reports that either the iteration budget or the time budget is spent.

use std::time::{Duration, Instant};

use crate::config::CheckerConfig;

#[derive(Debug, Clone)]
pub struct YieldTracker {
    iterations: u64,
    period: Duration,
    hits: u64,
    last_yield: Instant,
}

impl YieldTracker {
    /// `iterations` of zero is treated as one.
    #[must_use]
    pub fn new(iterations: u64, period: Duration) -> Self {
        Self::starting_at(iterations, period, Instant::now())
    }

    #[must_use]
    pub fn from_config(config: &CheckerConfig) -> Self {
        Self::new(
            config.yield_iterations,
            Duration::from_millis(config.yield_period_ms),
        )
    }

    #[must_use]
    pub fn starting_at(iterations: u64, period: Duration, now: Instant) -> Self {
        Self {
            iterations: iterations.max(1),
            period,
            hits: 0,
            last_yield: now,
        }
    }

    /// Count one scanned item; true means the driver should yield now.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> bool {
        self.hits = self.hits.saturating_add(1);
        if self.hits >= self.iterations
            || now.saturating_duration_since(self.last_yield) >= self.period
        {
            self.reset_at(now);
            return true;
        }
        false
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.hits = 0;
        self.last_yield = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_after_iteration_budget() {
        let start = Instant::now();
        let mut tracker = YieldTracker::starting_at(3, Duration::from_secs(3600), start);
        assert!(!tracker.tick_at(start));
        assert!(!tracker.tick_at(start));
        assert!(tracker.tick_at(start));
        // Budget restarts after a yield.
        assert!(!tracker.tick_at(start));
    }

    #[test]
    fn yields_after_time_budget() {
        let start = Instant::now();
        let mut tracker = YieldTracker::starting_at(1_000, Duration::from_millis(10), start);
        assert!(!tracker.tick_at(start + Duration::from_millis(5)));
        assert!(tracker.tick_at(start + Duration::from_millis(10)));
        assert!(!tracker.tick_at(start + Duration::from_millis(15)));
        assert!(tracker.tick_at(start + Duration::from_millis(21)));
    }

    #[test]
    fn zero_iterations_behaves_like_one() {
        let start = Instant::now();
        let mut tracker = YieldTracker::starting_at(0, Duration::from_secs(60), start);
        assert!(tracker.tick_at(start));
        assert!(tracker.tick_at(start));
    }

    #[test]
    fn from_config_uses_configured_budgets() {
        let config = CheckerConfig {
            yield_iterations: 2,
            yield_period_ms: 60_000,
            ..CheckerConfig::default()
        };
        let mut tracker = YieldTracker::from_config(&config);
        assert!(!tracker.tick());
        assert!(tracker.tick());
    }
}
