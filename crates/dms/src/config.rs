//! DMS configuration

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, TimeUnit};
use crate::DmsError;

/// Drowsiness detector configuration.
///
/// All durations are expressed in ticks of `time_unit`, the same unit the
/// observation timestamps are stamped in. Durations left out of a settings
/// source take the defaults rescaled to `time_unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PartialDmsConfig")]
pub struct DmsConfig {
    /// Sustained both-eyes-closed duration that raises the drowsy alarm
    pub closed_threshold: u64,

    /// How long unknown eye state is tolerated before the current window breaks
    pub absence_grace: u64,

    /// Sustained eyes-open duration required to clear an active alarm
    pub clear_hysteresis: u64,

    /// Unit of timestamps and durations
    pub time_unit: TimeUnit,
}

/// Settings-file shape of `DmsConfig`, every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialDmsConfig {
    closed_threshold: Option<u64>,
    absence_grace: Option<u64>,
    clear_hysteresis: Option<u64>,
    time_unit: TimeUnit,
}

impl From<PartialDmsConfig> for DmsConfig {
    fn from(partial: PartialDmsConfig) -> Self {
        let defaults = DmsConfig::for_unit(partial.time_unit);
        Self {
            closed_threshold: partial.closed_threshold.unwrap_or(defaults.closed_threshold),
            absence_grace: partial.absence_grace.unwrap_or(defaults.absence_grace),
            clear_hysteresis: partial.clear_hysteresis.unwrap_or(defaults.clear_hysteresis),
            time_unit: partial.time_unit,
        }
    }
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            closed_threshold: 1000,
            absence_grace: 500,
            clear_hysteresis: 300,
            time_unit: TimeUnit::Milliseconds,
        }
    }
}

impl DmsConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            closed_threshold: 700,
            absence_grace: 750,
            clear_hysteresis: 500,
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            closed_threshold: 1500,
            absence_grace: 300,
            clear_hysteresis: 200,
            ..Default::default()
        }
    }

    /// Default thresholds rescaled to `unit`.
    ///
    /// Coarse units round up, so a 500 ms grace becomes 1 s.
    pub fn for_unit(unit: TimeUnit) -> Self {
        let ms = Self::default();
        Self {
            closed_threshold: unit.from_millis(ms.closed_threshold),
            absence_grace: unit.from_millis(ms.absence_grace),
            clear_hysteresis: unit.from_millis(ms.clear_hysteresis),
            time_unit: unit,
        }
    }

    /// Reject configurations the detector cannot run with
    pub fn validate(&self) -> Result<(), DmsError> {
        if self.closed_threshold == 0 {
            return Err(DmsError::InvalidConfig(
                "closed_threshold must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Reject a clock whose ticks are not the unit these durations are in
    pub fn check_clock(&self, clock: &impl Clock) -> Result<(), DmsError> {
        if clock.unit() != self.time_unit {
            return Err(DmsError::InvalidConfig(format!(
                "clock counts {:?} but thresholds are in {:?}",
                clock.unit(),
                self.time_unit,
            )));
        }
        Ok(())
    }
}
