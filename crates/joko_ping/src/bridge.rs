//! The boundary between the overlay and whatever carries pings to other players.
//!
//! Publishing never blocks the frame: [PingBridge] only pushes onto a queue, and
//! [pump_outbound] drains it on its own thread. Delivery is best effort. A marker that failed
//! to go out stays in our store, peers just never see it.
//! Inbound events skip the gesture machine and go straight into the [MarkerStore].

use std::sync::Arc;
use std::thread::JoinHandle;

use flume::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::marker::{GroupId, MarkerId, PingMarker};
use crate::store::MarkerStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutboundPing {
    Publish { group: GroupId, marker: PingMarker },
    Remove { group: GroupId, id: MarkerId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InboundPing {
    Placed(PingMarker),
    Removed(MarkerId),
}

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TransportError {
    #[error("group {0} can't receive pings right now")]
    #[diagnostic(code(joko_ping::transport::unreachable))]
    Unreachable(GroupId),
    #[error("transport is closed")]
    #[diagnostic(code(joko_ping::transport::closed))]
    Closed,
    #[error("failed to send ping: {0}")]
    #[diagnostic(code(joko_ping::transport::send))]
    Send(String),
}

/// Delivers pings to the members of a group
pub trait PingTransport: Send {
    fn send(&mut self, message: OutboundPing) -> Result<(), TransportError>;
}

/// The overlay's handle to the outbound queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PingBridge {
    outbound: Sender<OutboundPing>,
}

impl PingBridge {
    /// the receiver goes to [pump_outbound] (or anything else that wants the messages)
    pub fn new() -> (Self, Receiver<OutboundPing>) {
        let (outbound, receiver) = flume::unbounded();
        (Self { outbound }, receiver)
    }
    pub fn publish(&self, group: &GroupId, marker: &PingMarker) {
        self.submit(OutboundPing::Publish {
            group: group.clone(),
            marker: marker.clone(),
        });
    }
    pub fn publish_removal(&self, group: &GroupId, id: MarkerId) {
        self.submit(OutboundPing::Remove {
            group: group.clone(),
            id,
        });
    }
    fn submit(&self, message: OutboundPing) {
        if let Err(e) = self.outbound.send(message) {
            debug!(?e, "outbound ping queue is closed. dropping message");
        }
    }
}

/// Hands every queued message to `transport` until all bridges are dropped.
pub fn pump_outbound(
    receiver: Receiver<OutboundPing>,
    mut transport: impl PingTransport + 'static,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for message in receiver.iter() {
            if let Err(e) = transport.send(message) {
                debug!(?e, "failed to publish ping");
            }
        }
        info!("outbound ping queue closed");
    })
}

/// Remote markers are stamped with our clock on arrival, so their animation starts now.
/// Returns whether the store changed.
pub fn apply_inbound(store: &MarkerStore, event: InboundPing, now: f64) -> bool {
    match event {
        InboundPing::Placed(mut marker) => {
            marker.created_at = now;
            debug!(id = %marker.id, sender = %marker.sender_display_name, "received ping");
            store.add(marker)
        }
        InboundPing::Removed(id) => {
            debug!(%id, "received ping removal");
            store.remove(&id)
        }
    }
}

/// Applies inbound events on their own thread until the sender side is dropped.
pub fn spawn_inbound(
    store: MarkerStore,
    receiver: Receiver<InboundPing>,
    clock: Arc<dyn Clock>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for event in receiver.iter() {
            apply_inbound(&store, event, clock.now());
        }
        info!("inbound ping queue closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::marker::MarkerType;
    use glam::Vec3;
    use uuid::Uuid;

    fn marker() -> PingMarker {
        PingMarker {
            id: Uuid::new_v4(),
            marker_type: MarkerType::Assist,
            world_position: Vec3::ONE,
            territory_id: 4,
            map_id: 4,
            created_at: 99999.0,
            sender_id: "peer".to_owned(),
            sender_display_name: "Peer".to_owned(),
            groups: vec![GroupId::new("party")],
            label: None,
        }
    }

    /// fails every other message, records the rest
    struct FlakyTransport {
        sent: Sender<OutboundPing>,
        attempts: usize,
    }
    impl PingTransport for FlakyTransport {
        fn send(&mut self, message: OutboundPing) -> Result<(), TransportError> {
            self.attempts += 1;
            if self.attempts % 2 == 0 {
                return Err(TransportError::Send("flaky".to_owned()));
            }
            self.sent.send(message).map_err(|_| TransportError::Closed)
        }
    }

    #[test]
    fn publishing_after_the_pump_is_gone_is_harmless() {
        let (bridge, receiver) = PingBridge::new();
        drop(receiver);
        bridge.publish(&GroupId::new("party"), &marker());
        bridge.publish_removal(&GroupId::new("party"), Uuid::new_v4());
    }

    #[test]
    fn pump_survives_failures() {
        let (bridge, receiver) = PingBridge::new();
        let (sent, delivered) = flume::unbounded();
        let pump = pump_outbound(receiver, FlakyTransport { sent, attempts: 0 });
        let group = GroupId::new("party");
        let markers: Vec<_> = (0..4).map(|_| marker()).collect();
        for m in &markers {
            bridge.publish(&group, m);
        }
        drop(bridge);
        pump.join().unwrap();
        let delivered: Vec<_> = delivered.try_iter().collect();
        similar_asserts::assert_eq!(
            delivered,
            vec![
                OutboundPing::Publish {
                    group: group.clone(),
                    marker: markers[0].clone()
                },
                OutboundPing::Publish {
                    group,
                    marker: markers[2].clone()
                },
            ]
        );
    }

    #[test]
    fn inbound_markers_use_our_clock() {
        let store = MarkerStore::new();
        let m = marker();
        assert!(apply_inbound(&store, InboundPing::Placed(m.clone()), 5.0));
        // duplicate delivery
        assert!(!apply_inbound(&store, InboundPing::Placed(m.clone()), 6.0));
        assert_eq!(store.get(&m.id).unwrap().created_at, 5.0);
        assert!(apply_inbound(&store, InboundPing::Removed(m.id), 7.0));
        assert!(!apply_inbound(&store, InboundPing::Removed(m.id), 7.0));
    }

    #[test]
    fn inbound_thread_applies_events() {
        let store = MarkerStore::new();
        let clock = Arc::new(ManualClock::new(3.0));
        let (sender, receiver) = flume::unbounded();
        let thread = spawn_inbound(store.clone(), receiver, clock);
        let kept = marker();
        let removed = marker();
        sender.send(InboundPing::Placed(kept.clone())).unwrap();
        sender.send(InboundPing::Placed(removed.clone())).unwrap();
        sender.send(InboundPing::Removed(removed.id)).unwrap();
        drop(sender);
        thread.join().unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&kept.id).unwrap().created_at, 3.0);
    }
}
