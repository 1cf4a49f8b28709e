//! Events published by the detector

use serde::{Deserialize, Serialize};

/// Transition crossed while ingesting an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrowsinessEvent {
    /// Nothing worth reporting
    #[default]
    None,

    /// Both eyes stayed closed past the threshold; `since` is the first closed frame
    DrowsyAlarm { since: u64 },

    /// Eyes stayed open long enough to silence the alarm
    Cleared { at: u64 },
}

impl DrowsinessEvent {
    /// Check if the event carries a transition
    pub fn is_some(&self) -> bool {
        !matches!(self, DrowsinessEvent::None)
    }

    pub fn is_alarm(&self) -> bool {
        matches!(self, DrowsinessEvent::DrowsyAlarm { .. })
    }

    pub fn is_cleared(&self) -> bool {
        matches!(self, DrowsinessEvent::Cleared { .. })
    }
}
