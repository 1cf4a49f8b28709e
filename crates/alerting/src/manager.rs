//! Alert Manager Implementation

use dms::DrowsinessEvent;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::AlarmSink;

/// Alert configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Time an alarm may stay active before it escalates to critical
    /// (detector clock ticks, measured from the first closed frame)
    pub escalate_after: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            escalate_after: 3000,
        }
    }
}

/// Severity of the active alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

/// State of the active alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertState {
    /// First closed frame of the episode
    pub since: u64,
    /// Whether the driver dismissed the alarm
    pub acknowledged: bool,
}

/// Alarm sink tracking drowsiness episodes
pub struct AlertManager {
    /// Configuration
    config: AlertConfig,
    /// Active episode, if any
    active: Option<AlertState>,
    /// Episodes raised since creation
    fire_count: usize,
    /// Time of the most recent clear
    last_cleared: Option<u64>,
    /// Events that broke alarm/clear alternation
    out_of_order: usize,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating alert manager with config: {:?}", config);
        Self {
            config,
            active: None,
            fire_count: 0,
            last_cleared: None,
            out_of_order: 0,
        }
    }

    /// Apply an event. Returns `true` when the alarm state changed.
    pub fn handle(&mut self, event: DrowsinessEvent) -> bool {
        match event {
            DrowsinessEvent::None => false,
            DrowsinessEvent::DrowsyAlarm { since } => {
                if let Some(active) = self.active {
                    warn!("Alarm since {} while alarm since {} still active, ignoring", since, active.since);
                    self.out_of_order += 1;
                    return false;
                }
                self.fire_count += 1;
                self.active = Some(AlertState {
                    since,
                    acknowledged: false,
                });
                info!("Drowsiness alarm raised (eyes closed since {}, count: {})", since, self.fire_count);
                true
            }
            DrowsinessEvent::Cleared { at } => match self.active.take() {
                Some(state) => {
                    self.last_cleared = Some(at);
                    info!("Drowsiness alarm cleared at {} after {}", at, at.saturating_sub(state.since));
                    true
                }
                None => {
                    warn!("Clear at {} without an active alarm, ignoring", at);
                    self.out_of_order += 1;
                    false
                }
            },
        }
    }

    /// Acknowledge the active alarm without clearing it
    pub fn acknowledge(&mut self) -> bool {
        match self.active.as_mut() {
            Some(state) => {
                state.acknowledged = true;
                info!("Alarm acknowledged");
                true
            }
            None => {
                debug!("Nothing to acknowledge");
                false
            }
        }
    }

    /// Severity of the active alarm at `now`
    pub fn severity(&self, now: u64) -> Option<Severity> {
        self.active.map(|state| {
            if now.saturating_sub(state.since) >= self.config.escalate_after {
                Severity::Critical
            } else {
                Severity::Warning
            }
        })
    }

    pub fn active(&self) -> Option<&AlertState> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Active alarm not yet acknowledged
    pub fn pending(&self) -> Option<&AlertState> {
        self.active.as_ref().filter(|state| !state.acknowledged)
    }

    /// Number of alarms raised
    pub fn fire_count(&self) -> usize {
        self.fire_count
    }

    pub fn last_cleared(&self) -> Option<u64> {
        self.last_cleared
    }

    /// Number of events ignored for breaking alternation
    pub fn out_of_order(&self) -> usize {
        self.out_of_order
    }

    /// Clear all alert states
    pub fn clear(&mut self) {
        self.active = None;
        self.fire_count = 0;
        self.last_cleared = None;
        self.out_of_order = 0;
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

impl AlarmSink for AlertManager {
    fn publish(&mut self, event: DrowsinessEvent) {
        self.handle(event);
    }
}
