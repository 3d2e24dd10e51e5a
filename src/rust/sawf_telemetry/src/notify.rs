//! Breach notification sinks.

use crossbeam_channel::{Receiver, Sender};
use sawf_config::SlaParameter;
use sawf_utils::MacAddress;
use serde::Serialize;
use tracing::{info, warn};

/// A change in breach state for one parameter of one peer queue.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BreachEvent {
    /// Peer MAC address
    pub mac: MacAddress,
    /// Service class of the queue
    pub service_class_id: u8,
    /// The SLA parameter whose state changed
    pub parameter: SlaParameter,
    /// True when the SLA is now breached, false when it has recovered
    pub breached: bool,
    /// TID of the queue
    pub tid: u8,
}

/// Receives breach/clear transitions. Only changes of state are delivered:
/// a parameter that stays breached is reported once.
pub trait BreachNotifier: Send + Sync {
    /// Deliver one transition.
    fn notify_breach(&self, event: &BreachEvent);
}

/// Writes every transition to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl BreachNotifier for LogNotifier {
    fn notify_breach(&self, event: &BreachEvent) {
        if event.breached {
            warn!(
                "SLA {} breach: peer {} service class {} tid {}",
                event.parameter, event.mac, event.service_class_id, event.tid
            );
        } else {
            info!(
                "SLA {} recovered: peer {} service class {} tid {}",
                event.parameter, event.mac, event.service_class_id, event.tid
            );
        }
    }
}

/// Forwards transitions over a crossbeam channel, for consumers that want
/// to handle them on their own thread.
pub struct ChannelNotifier {
    tx: Sender<BreachEvent>,
}

impl ChannelNotifier {
    /// Build a notifier and the receiving end of its channel.
    pub fn new() -> (Self, Receiver<BreachEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl BreachNotifier for ChannelNotifier {
    fn notify_breach(&self, event: &BreachEvent) {
        if self.tx.send(*event).is_err() {
            warn!("Breach receiver has gone away, dropping {:?}", event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_delivers_in_order() {
        let (notifier, rx) = ChannelNotifier::new();
        let mut event = BreachEvent {
            mac: MacAddress::new([0, 1, 2, 3, 4, 5]),
            service_class_id: 5,
            parameter: SlaParameter::MinThroughput,
            breached: true,
            tid: 0,
        };
        notifier.notify_breach(&event);
        event.breached = false;
        notifier.notify_breach(&event);
        assert!(rx.recv().unwrap().breached);
        assert!(!rx.recv().unwrap().breached);
        assert!(rx.try_recv().is_err());
    }
}
