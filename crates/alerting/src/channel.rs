//! Cross-thread event delivery

use dms::DrowsinessEvent;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{AlarmSink, AlertError};

/// Sink forwarding transitions to another thread.
///
/// `None` events are dropped at the sender so the channel only carries
/// alarm and clear transitions.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<DrowsinessEvent>,
}

impl ChannelSink {
    /// Create a connected sink/receiver pair
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { sender: tx }, EventReceiver { receiver: rx })
    }

    /// Forward an event, failing if the receiver is gone
    pub fn send(&self, event: DrowsinessEvent) -> Result<(), AlertError> {
        if !event.is_some() {
            return Ok(());
        }
        self.sender
            .send(event)
            .map_err(|e| AlertError::ChannelClosed(e.0))
    }
}

impl AlarmSink for ChannelSink {
    fn publish(&mut self, event: DrowsinessEvent) {
        if let Err(e) = self.send(event) {
            warn!("{}", e);
        }
    }
}

/// Receiving half of a [`ChannelSink`]
#[derive(Debug)]
pub struct EventReceiver {
    receiver: mpsc::UnboundedReceiver<DrowsinessEvent>,
}

impl EventReceiver {
    /// Receive next event, `None` once every sender is dropped
    pub async fn recv(&mut self) -> Option<DrowsinessEvent> {
        self.receiver.recv().await
    }

    /// Deliver events to `sink` until all senders are dropped.
    /// Returns the number of events delivered.
    pub async fn run<S: AlarmSink>(mut self, sink: &mut S) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.receiver.recv().await {
            sink.publish(event);
            delivered += 1;
        }
        debug!("Event channel closed after {} events", delivered);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AlertManager;

    #[tokio::test]
    async fn test_forwards_transitions_only() {
        let (mut sink, mut rx) = ChannelSink::channel();

        sink.publish(DrowsinessEvent::None);
        sink.publish(DrowsinessEvent::DrowsyAlarm { since: 300 });
        sink.publish(DrowsinessEvent::None);
        sink.publish(DrowsinessEvent::Cleared { at: 2200 });
        drop(sink);

        assert_eq!(rx.recv().await, Some(DrowsinessEvent::DrowsyAlarm { since: 300 }));
        assert_eq!(rx.recv().await, Some(DrowsinessEvent::Cleared { at: 2200 }));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_run_into_manager() {
        let (sink, rx) = ChannelSink::channel();

        let producer = tokio::spawn(async move {
            sink.send(DrowsinessEvent::DrowsyAlarm { since: 0 }).unwrap();
            sink.send(DrowsinessEvent::Cleared { at: 1400 }).unwrap();
            sink.send(DrowsinessEvent::DrowsyAlarm { since: 2000 }).unwrap();
        });

        let mut manager = AlertManager::default();
        let delivered = rx.run(&mut manager).await;
        producer.await.unwrap();

        assert_eq!(delivered, 3);
        assert_eq!(manager.fire_count(), 2);
        assert_eq!(manager.active().map(|s| s.since), Some(2000));
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);

        assert!(sink.send(DrowsinessEvent::None).is_ok());
        assert_eq!(
            sink.send(DrowsinessEvent::Cleared { at: 5 }),
            Err(AlertError::ChannelClosed(DrowsinessEvent::Cleared { at: 5 }))
        );
    }
}
