//! Wall-clock access, injected so planning runs can be pinned in tests.

use chrono::{DateTime, NaiveDate, Utc};

/// Source of "now" for the planning services.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date used for horizons and expected receipt dates.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The real system clock.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Copy, Clone)]
pub struct FixedClock {
    at: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }

    /// Midnight UTC of the given date.
    pub fn on(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}
