//! Drowsiness Monitor
//!
//! Host wiring around the detector: settings, logging, and replay of
//! recorded observation traces into an alert manager on its own task.

use std::io::BufRead;

use alerting::{AlarmSink, AlertManager, ChannelSink, Severity};
use dms::{DmsError, DrowsinessDetector, DrowsinessEvent, Phase};
use eye_source::{EyeClassifier, SourceError, TraceReader};
use metrics::{counter, gauge};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod settings;

pub use settings::{ClassifierSettings, Settings};

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Detector error: {0}")]
    Detector(#[from] DmsError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Unknown log level: {0}")]
    LogLevel(String),

    #[error("Failed to set tracing subscriber: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Alert task failed: {0}")]
    AlertTask(#[from] tokio::task::JoinError),
}

/// Outcome of a trace replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub observations: usize,
    pub rejected: usize,
    pub alarms: usize,
    pub clears: usize,
    pub final_phase: Phase,
    /// Severity of the alarm still active at the end of the trace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// Initialize logging
pub fn init_logging(settings: &Settings) -> Result<(), MonitorError> {
    let level: Level = settings
        .log_level
        .parse()
        .map_err(|_| MonitorError::LogLevel(settings.log_level.clone()))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if settings.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Replay a trace through the detector.
///
/// Events travel over a channel to an [`AlertManager`] running on a separate
/// task, the way a frame callback hands off to an alarm presenter.
pub async fn replay<R: BufRead>(settings: &Settings, reader: R) -> Result<ReplaySummary, MonitorError> {
    let classifier = EyeClassifier::new(settings.classifier.open_threshold)?;
    let mut detector = DrowsinessDetector::new(settings.detector)?;

    let (mut sink, receiver) = ChannelSink::channel();
    let alert_config = settings.alerting;
    let alerts = tokio::spawn(async move {
        let mut manager = AlertManager::new(alert_config);
        receiver.run(&mut manager).await;
        manager
    });

    let mut summary = ReplaySummary::default();
    let mut last_timestamp = 0;

    for obs in TraceReader::with_classifier(reader, classifier) {
        let obs = obs?;
        summary.observations += 1;
        counter!("dms_observations_total").increment(1);

        let event = match detector.ingest(obs) {
            Ok(event) => event,
            Err(DmsError::NonMonotonicTime { previous, current }) => {
                warn!("Skipping frame at {} (previous {})", current, previous);
                summary.rejected += 1;
                counter!("dms_observations_rejected_total").increment(1);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        last_timestamp = obs.timestamp;

        match event {
            DrowsinessEvent::DrowsyAlarm { .. } => {
                summary.alarms += 1;
                counter!("dms_alarms_total").increment(1);
                gauge!("dms_alarm_active").set(1.0);
            }
            DrowsinessEvent::Cleared { .. } => {
                summary.clears += 1;
                counter!("dms_alarms_cleared_total").increment(1);
                gauge!("dms_alarm_active").set(0.0);
            }
            DrowsinessEvent::None => {}
        }
        sink.publish(event);
    }

    summary.final_phase = detector.phase();
    drop(sink);

    let manager = alerts.await?;
    summary.severity = manager.severity(last_timestamp);

    info!(
        "Replay finished: {} observations, {} rejected, {} alarms, {} cleared, phase {:?}",
        summary.observations, summary.rejected, summary.alarms, summary.clears, summary.final_phase
    );
    Ok(summary)
}
