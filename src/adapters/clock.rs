//! Clock implementations.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::ports::Clock;

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn monotonic(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// `advance` moves both readings forward. With a non-zero `step`, every
/// monotonic reading also moves time forward by `step` afterwards, which lets
/// tests run a budget out after a known number of checks.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    utc_origin: DateTime<Utc>,
    offset: Mutex<Duration>,
    step: Duration,
}

impl ManualClock {
    pub fn at(utc: DateTime<Utc>) -> Self {
        Self {
            origin: Instant::now(),
            utc_origin: utc,
            offset: Mutex::new(Duration::ZERO),
            step: Duration::ZERO,
        }
    }

    /// Advance by `step` after every monotonic reading.
    #[must_use]
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }

    fn offset(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(Utc.with_ymd_and_hms(2024, 11, 10, 12, 0, 0).single().unwrap_or_default())
    }
}

impl Clock for ManualClock {
    fn monotonic(&self) -> Instant {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        let reading = self.origin + *offset;
        *offset += self.step;
        reading
    }

    fn now_utc(&self) -> DateTime<Utc> {
        let offset = chrono::Duration::from_std(self.offset()).unwrap_or_default();
        self.utc_origin + offset
    }
}
