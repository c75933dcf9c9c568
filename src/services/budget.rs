//! Wall-clock budget for cleanup passes.
//!
//! A pass captures a start instant once and asks [`BudgetClock::expired`] at
//! each loop boundary. The check is cooperative: nothing is interrupted
//! mid-call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::domain::ports::Clock;

/// A time budget in seconds. Zero or negative means "no limit".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeBudget(f64);

impl TimeBudget {
    pub const UNLIMITED: Self = Self(0.0);

    pub const fn from_secs(seconds: f64) -> Self {
        Self(seconds)
    }

    pub const fn seconds(self) -> f64 {
        self.0
    }

    pub fn is_unlimited(self) -> bool {
        self.0 <= 0.0
    }
}

/// Measures elapsed time against a [`TimeBudget`].
#[derive(Clone)]
pub struct BudgetClock {
    clock: Arc<dyn Clock>,
}

impl BudgetClock {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Capture the instant a pass begins.
    pub fn start(&self) -> Instant {
        self.clock.monotonic()
    }

    pub fn elapsed(&self, start: Instant) -> Duration {
        self.clock.monotonic().saturating_duration_since(start)
    }

    /// True iff the budget is limited and strictly more than it has elapsed.
    pub fn expired(&self, start: Instant, budget: TimeBudget) -> bool {
        !budget.is_unlimited() && self.elapsed(start).as_secs_f64() > budget.seconds()
    }
}

impl std::fmt::Debug for BudgetClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BudgetClock").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;

    fn budget_clock() -> (Arc<ManualClock>, BudgetClock) {
        let manual = Arc::new(ManualClock::default());
        let clock = BudgetClock::new(manual.clone());
        (manual, clock)
    }

    #[test]
    fn test_not_expired_before_budget() {
        let (manual, clock) = budget_clock();
        let start = clock.start();
        manual.advance(Duration::from_secs(9));
        assert!(!clock.expired(start, TimeBudget::from_secs(10.0)));
    }

    #[test]
    fn test_exactly_at_budget_is_not_expired() {
        let (manual, clock) = budget_clock();
        let start = clock.start();
        manual.advance(Duration::from_secs(10));
        assert!(!clock.expired(start, TimeBudget::from_secs(10.0)));
    }

    #[test]
    fn test_expired_past_budget() {
        let (manual, clock) = budget_clock();
        let start = clock.start();
        manual.advance(Duration::from_millis(10_001));
        assert!(clock.expired(start, TimeBudget::from_secs(10.0)));
    }

    #[test]
    fn test_non_positive_budget_never_expires() {
        let (manual, clock) = budget_clock();
        let start = clock.start();
        manual.advance(Duration::from_secs(86_400));
        assert!(!clock.expired(start, TimeBudget::UNLIMITED));
        assert!(!clock.expired(start, TimeBudget::from_secs(-5.0)));
        assert!(TimeBudget::from_secs(-5.0).is_unlimited());
    }
}
