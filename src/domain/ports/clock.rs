use std::time::Instant;

use chrono::{DateTime, Utc};

/// Time source for budgets and age checks.
pub trait Clock: Send + Sync {
    /// Monotonic instant used to measure elapsed budget.
    fn monotonic(&self) -> Instant;

    /// Current wall-clock time used to age tasks and stamp titles.
    fn now_utc(&self) -> DateTime<Utc>;
}
