//! Alerting System
//!
//! Consumes drowsiness events: tracks alarm episodes, acknowledgement and
//! severity, and hands events across threads.

mod channel;
mod manager;

pub use channel::{ChannelSink, EventReceiver};
pub use manager::{AlertConfig, AlertManager, AlertState, Severity};

use dms::DrowsinessEvent;
use thiserror::Error;

/// Alerting error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertError {
    #[error("Event receiver dropped, {0:?} not delivered")]
    ChannelClosed(DrowsinessEvent),
}

/// Consumer of detector events.
///
/// Must be idempotent with respect to `None` and accept `DrowsyAlarm` and
/// `Cleared` in strict alternation.
pub trait AlarmSink {
    fn publish(&mut self, event: DrowsinessEvent);
}

impl<S: AlarmSink + ?Sized> AlarmSink for &mut S {
    fn publish(&mut self, event: DrowsinessEvent) {
        (**self).publish(event);
    }
}
