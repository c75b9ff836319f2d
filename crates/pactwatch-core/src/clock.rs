//! # Clock
//!
//! Source of the reference instant used for risk classification.
//!
//! The classifier and catalog never ask for the time themselves; callers
//! obtain it from a `Clock` and pass it in.

use chrono::{DateTime, NaiveDate, Utc};

/// Supplies the current reference instant.
pub trait Clock: Send + Sync {
    /// The instant to classify against.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pin the clock to 00:00 UTC on a calendar date.
    #[must_use]
    pub fn at_date(date: NaiveDate) -> Self {
        Self(crate::risk::start_of_day(date))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
