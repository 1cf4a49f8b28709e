//! Driver Monitoring System (DMS)
//!
//! Drowsiness detection from per-frame eye observations:
//! - Both-eye fusion into an open/closed/unknown verdict
//! - Closure timing with a grace window for detector dropouts
//! - Alarm raise when closure crosses a threshold
//! - Hysteresis before an active alarm clears
//!
//! Camera capture, face detection and alarm presentation live outside this
//! crate; timestamps arrive with each observation.

pub mod clock;
pub mod config;
pub mod detector;
pub mod event;
pub mod observation;
pub mod state;

pub use clock::{Clock, ManualClock, MonotonicClock, TimeUnit};
pub use config::DmsConfig;
pub use detector::DrowsinessDetector;
pub use event::DrowsinessEvent;
pub use observation::{EyeState, EyeVerdict, Observation};
pub use state::{DetectorState, Phase};

use thiserror::Error;

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DmsError {
    #[error("Observation rejected: timestamp {current} is before {previous}")]
    NonMonotonicTime { previous: u64, current: u64 },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}
