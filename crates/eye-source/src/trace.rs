//! Recorded observation traces
//!
//! One JSON record per line. A record is either a detector observation
//! (`{"timestamp": 100, "left": "open", "right": "closed"}`, missing eyes are
//! absent) or a raw landmark frame, which is classified on the way in.
//! Blank lines and lines starting with `#` are skipped.

use std::io::BufRead;

use dms::Observation;
use serde::Deserialize;
use tracing::debug;

use crate::landmark::{EyeClassifier, LandmarkFrame};
use crate::SourceError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TraceRecord {
    Observation(Observation),
    Landmark(LandmarkFrame),
}

/// Iterator over the observations of a trace
pub struct TraceReader<R> {
    reader: R,
    classifier: EyeClassifier,
    line: usize,
    buf: String,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_classifier(reader, EyeClassifier::default())
    }

    /// Use `classifier` for landmark records
    pub fn with_classifier(reader: R, classifier: EyeClassifier) -> Self {
        Self {
            reader,
            classifier,
            line: 0,
            buf: String::new(),
        }
    }

    /// Line number of the last record returned
    pub fn line(&self) -> usize {
        self.line
    }

    fn parse(&self, text: &str) -> Result<Observation, SourceError> {
        let record: TraceRecord = serde_json::from_str(text).map_err(|source| SourceError::Parse {
            line: self.line,
            source,
        })?;
        Ok(match record {
            TraceRecord::Observation(obs) => obs,
            TraceRecord::Landmark(frame) => self.classifier.observe(&frame),
        })
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<Observation, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => {
                    debug!("Trace exhausted after {} lines", self.line);
                    return None;
                }
                Ok(_) => self.line += 1,
                Err(e) => return Some(Err(e.into())),
            }

            let text = self.buf.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            return Some(self.parse(text));
        }
    }
}
