//! Layered monitor settings
//!
//! Built-in defaults, then an optional TOML file, then `DROWSY_*`
//! environment variables (`__` separates nested keys, e.g.
//! `DROWSY_DETECTOR__CLOSED_THRESHOLD=1500`).

use std::path::Path;

use alerting::AlertConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use dms::DmsConfig;
use eye_source::landmark::DEFAULT_OPEN_THRESHOLD;
use serde::{Deserialize, Serialize};

use crate::MonitorError;

/// Eye classifier settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Probability at or above which an eye counts as open
    pub open_threshold: f32,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            open_threshold: DEFAULT_OPEN_THRESHOLD,
        }
    }
}

/// Monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub detector: DmsConfig,
    pub classifier: ClassifierSettings,
    pub alerting: AlertConfig,
    /// One of trace, debug, info, warn, error
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            detector: DmsConfig::default(),
            classifier: ClassifierSettings::default(),
            alerting: AlertConfig::default(),
            log_level: "info".into(),
            log_json: false,
        }
    }
}

impl Settings {
    /// Load settings from an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix("DROWSY")
                .prefix_separator("_")
                .separator("__"),
        );
        Self::build(builder)
    }

    /// Parse settings from TOML text
    pub fn from_toml(text: &str) -> Result<Self, MonitorError> {
        Self::build(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, MonitorError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.detector.validate()?;
        Ok(settings)
    }
}
