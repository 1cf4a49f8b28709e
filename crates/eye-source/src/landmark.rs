//! Landmark detector output and per-eye classification

use dms::{Clock, EyeState, Observation};
use serde::{Deserialize, Serialize};

use crate::SourceError;

/// Default probability at or above which an eye counts as open
pub const DEFAULT_OPEN_THRESHOLD: f32 = 0.4;

/// One eye as reported by the face tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EyeLandmark {
    /// Eye centre in preview coordinates, missing when the face was lost
    pub position: Option<(f32, f32)>,
    /// Open probability; negative or missing when the tracker did not compute it
    pub open_probability: Option<f32>,
}

impl EyeLandmark {
    pub fn new(x: f32, y: f32, open_probability: f32) -> Self {
        Self {
            position: Some((x, y)),
            open_probability: Some(open_probability),
        }
    }

    /// Probability usable for classification, if any
    fn probability(&self) -> Option<f32> {
        self.position
            .and(self.open_probability)
            .filter(|p| p.is_finite() && *p >= 0.0)
    }
}

/// Face tracker output for a single preview frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LandmarkFrame {
    /// Capture time in the clock's unit
    pub timestamp: u64,
    /// Frame sequence number
    #[serde(default)]
    pub sequence: u32,
    #[serde(default)]
    pub left: EyeLandmark,
    #[serde(default)]
    pub right: EyeLandmark,
}

impl LandmarkFrame {
    /// Stamp a live frame with the host clock
    pub fn stamped(clock: &impl Clock, sequence: u32, left: EyeLandmark, right: EyeLandmark) -> Self {
        Self {
            timestamp: clock.now(),
            sequence,
            left,
            right,
        }
    }

    /// Frame with no face in view
    pub fn empty(timestamp: u64, sequence: u32) -> Self {
        Self {
            timestamp,
            sequence,
            ..Default::default()
        }
    }
}

/// Thresholds open probabilities into eye states
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeClassifier {
    open_threshold: f32,
}

impl Default for EyeClassifier {
    fn default() -> Self {
        Self {
            open_threshold: DEFAULT_OPEN_THRESHOLD,
        }
    }
}

impl EyeClassifier {
    pub fn new(open_threshold: f32) -> Result<Self, SourceError> {
        if !(0.0..=1.0).contains(&open_threshold) {
            return Err(SourceError::InvalidThreshold(open_threshold));
        }
        Ok(Self { open_threshold })
    }

    pub fn open_threshold(&self) -> f32 {
        self.open_threshold
    }

    /// Classify a single eye; a lost position or uncomputed probability is `Absent`
    pub fn classify(&self, eye: &EyeLandmark) -> EyeState {
        match eye.probability() {
            Some(p) if p >= self.open_threshold => EyeState::Open,
            Some(_) => EyeState::Closed,
            None => EyeState::Absent,
        }
    }

    /// Convert a landmark frame into a detector observation
    pub fn observe(&self, frame: &LandmarkFrame) -> Observation {
        Observation::new(
            frame.timestamp,
            self.classify(&frame.left),
            self.classify(&frame.right),
        )
    }
}
