//! Clock implementations.

use std::sync::{Mutex, PoisonError};

use chrono::{Duration, FixedOffset, Offset, Utc};
use growhub_domain::time::{self, Timestamp};

use crate::ports::Clock;

/// Wall clock of the host, with a configured local UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    #[must_use]
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        time::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// A clock that only moves when told to. Used to replay ticks at chosen
/// instants and in tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
    offset: FixedOffset,
}

impl ManualClock {
    #[must_use]
    pub fn new(now: Timestamp, offset: FixedOffset) -> Self {
        Self {
            now: Mutex::new(now),
            offset,
        }
    }

    /// A manual clock whose local time is UTC.
    #[must_use]
    pub fn utc(now: Timestamp) -> Self {
        Self::new(now, Utc.fix())
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}
