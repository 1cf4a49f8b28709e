//! Eye Observation Sources
//!
//! Feeds the drowsiness detector from upstream face trackers:
//! - Landmark frames (eye position + open probability) classified per eye
//! - Recorded observation traces in JSON lines

pub mod landmark;
pub mod trace;

pub use landmark::{EyeClassifier, EyeLandmark, LandmarkFrame};
pub use trace::TraceReader;

use thiserror::Error;

/// Source error types
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed observation on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Open threshold {0} is outside [0, 1]")]
    InvalidThreshold(f32),
}
