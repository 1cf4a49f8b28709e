//! Detector state tracking

use serde::{Deserialize, Serialize};

/// High-level detector phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// No valid observation yet, or the last window was broken by absence
    #[default]
    Idle,
    /// Most recent window has both eyes open
    Open,
    /// Both eyes closed, accumulating toward the threshold
    Closing,
    /// Threshold crossed, alarm not yet cleared
    Alarming,
}

/// Detector state (tracked over time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetectorState {
    pub phase: Phase,

    /// First frame of the current closed run. Set only while Closing or Alarming.
    pub closed_since: Option<u64>,

    /// Timestamp of the last accepted observation
    pub last_seen: Option<u64>,

    /// Timestamp of the last observation with a definite open/closed verdict
    pub last_valid: Option<u64>,

    pub last_both_eyes_open: Option<u64>,

    /// Start of the open run that will clear an active alarm
    pub pending_clear_since: Option<u64>,
}

impl DetectorState {
    /// Closure duration at `now`, if a closed run is in progress
    pub fn closed_for(&self, now: u64) -> Option<u64> {
        self.closed_since.map(|since| now.saturating_sub(since))
    }

    /// Reset state (on driver change).
    ///
    /// `last_seen` survives so the monotonic-time guard still holds.
    pub fn reset(&mut self) {
        *self = Self {
            last_seen: self.last_seen,
            ..Self::default()
        };
    }
}
