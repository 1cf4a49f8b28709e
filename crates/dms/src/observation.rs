//! Per-frame eye observations and both-eye fusion

use serde::{Deserialize, Serialize};

/// Reported state of a single eye
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeState {
    Open,
    Closed,
    /// Detector lost the eye (no face, landmark missing)
    #[default]
    Absent,
}

/// One frame's worth of eye state from the landmark detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Observation {
    /// Capture time in the clock's unit
    pub timestamp: u64,
    #[serde(default)]
    pub left: EyeState,
    #[serde(default)]
    pub right: EyeState,
}

impl Observation {
    pub fn new(timestamp: u64, left: EyeState, right: EyeState) -> Self {
        Self {
            timestamp,
            left,
            right,
        }
    }

    /// Both eyes reported with the same state
    pub fn both(timestamp: u64, state: EyeState) -> Self {
        Self::new(timestamp, state, state)
    }

    /// Face lost for this frame
    pub fn absent(timestamp: u64) -> Self {
        Self::both(timestamp, EyeState::Absent)
    }

    pub fn verdict(&self) -> EyeVerdict {
        EyeVerdict::fuse(self.left, self.right)
    }
}

/// Fused verdict for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EyeVerdict {
    Open,
    Closed,
    Unknown,
}

impl EyeVerdict {
    /// Combine left and right readings.
    ///
    /// Only agreement counts: a wink or a single dropped eye is detector
    /// noise and yields `Unknown`.
    pub fn fuse(left: EyeState, right: EyeState) -> Self {
        match (left, right) {
            (EyeState::Open, EyeState::Open) => EyeVerdict::Open,
            (EyeState::Closed, EyeState::Closed) => EyeVerdict::Closed,
            _ => EyeVerdict::Unknown,
        }
    }
}
