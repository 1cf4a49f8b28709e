//! Monotonic time sources
//!
//! The detector never reads a clock itself; timestamps travel inside each
//! [`Observation`](crate::Observation). Hosts stamp frames with a [`Clock`],
//! tests drive the detector with synthetic time.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Resolution of a clock's ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    #[default]
    Milliseconds,
}

impl TimeUnit {
    /// Convert a millisecond duration into ticks of this unit, rounding up
    pub fn from_millis(self, ms: u64) -> u64 {
        match self {
            TimeUnit::Seconds => ms.div_ceil(1000),
            TimeUnit::Milliseconds => ms,
        }
    }

    /// Short suffix for log output
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
        }
    }
}

/// Non-decreasing time source
pub trait Clock {
    /// Current time in ticks of [`Clock::unit`]
    fn now(&self) -> u64;

    fn unit(&self) -> TimeUnit;
}

/// Clock backed by [`Instant`], counting from its creation.
///
/// `Instant` is monotonic, so readings survive pause/resume of the host
/// without jumping backwards.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
    unit: TimeUnit,
}

impl MonotonicClock {
    pub fn new(unit: TimeUnit) -> Self {
        Self {
            origin: Instant::now(),
            unit,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new(TimeUnit::Milliseconds)
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> u64 {
        let elapsed = self.origin.elapsed();
        match self.unit {
            TimeUnit::Seconds => elapsed.as_secs(),
            TimeUnit::Milliseconds => u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    fn unit(&self) -> TimeUnit {
        self.unit
    }
}

/// Manually driven clock for tests and trace replay
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: AtomicU64,
    unit: TimeUnit,
}

impl ManualClock {
    pub fn new(unit: TimeUnit) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            unit,
        }
    }

    /// Move the clock forward by `ticks`
    pub fn advance(&self, ticks: u64) {
        self.ticks.fetch_add(ticks, Ordering::SeqCst);
    }

    /// Jump to `ticks`; earlier values are ignored so the clock never runs backwards
    pub fn set(&self, ticks: u64) {
        self.ticks.fetch_max(ticks, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    fn unit(&self) -> TimeUnit {
        self.unit
    }
}
