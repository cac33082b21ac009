//! In-process notification bus and loopback broadcast channel.
//!
//! Both are thin fanout layers over `tokio::sync::broadcast`. They model
//! the contracts of the external collaborators — an at-least-once push
//! stream of inserted rows, and a per-sender-ordered data channel — for
//! loopback sessions and tests. Subscribing spawns a forwarding task, so a
//! tokio runtime must be running.

use tokio::sync::{broadcast, mpsc};

use plenum_core::domain::TranscriptSegment;
use plenum_core::ports::{
    BroadcastChannel, BroadcastPayload, SegmentEvent, SegmentNotifications, StoreError,
};

// ── Segment bus ────────────────────────────────────────────────────

/// Fanout of newly inserted transcript segments.
///
/// A slow subscriber does not block publishers: when it falls behind the
/// channel capacity, dropped insertions surface as [`SegmentEvent::Lagged`]
/// and the subscriber degrades to local-only captions.
#[derive(Clone)]
pub struct SegmentBus {
    tx: broadcast::Sender<TranscriptSegment>,
}

impl SegmentBus {
    /// Create a bus holding at most `capacity` in-flight segments per
    /// subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Push one inserted segment to all subscribers.
    pub fn publish(&self, segment: TranscriptSegment) {
        // No subscribers is fine — nobody is listening translated yet.
        let _ = self.tx.send(segment);
    }

    /// Subscribe to insertions for one room.
    #[must_use]
    pub fn subscribe_room(&self, room_id: &str) -> mpsc::UnboundedReceiver<SegmentEvent> {
        let mut rx = self.tx.subscribe();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let room = room_id.to_string();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(segment) if segment.room_id == room => {
                        if out_tx.send(SegmentEvent::Inserted(segment)).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {} // other room
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(room = %room, missed, "Segment subscriber lagged");
                        if out_tx.send(SegmentEvent::Lagged(missed)).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        out_rx
    }
}

impl SegmentNotifications for SegmentBus {
    fn subscribe(&self, room_id: &str) -> mpsc::UnboundedReceiver<SegmentEvent> {
        self.subscribe_room(room_id)
    }
}

// ── Loopback broadcast ─────────────────────────────────────────────

/// In-process implementation of the session data channel.
///
/// Delivers every payload to every subscriber (including the sender's
/// own); receivers filter by `sender_id`, exactly as they must with the
/// real transport.
#[derive(Clone)]
pub struct LoopbackBroadcast {
    tx: broadcast::Sender<BroadcastPayload>,
}

impl LoopbackBroadcast {
    /// Create a channel with the given per-subscriber capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl BroadcastChannel for LoopbackBroadcast {
    fn publish(&self, sender_id: &str, data: Vec<u8>) -> Result<(), StoreError> {
        let _ = self.tx.send(BroadcastPayload {
            sender_id: sender_id.to_string(),
            data,
        });
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<BroadcastPayload> {
        let mut rx = self.tx.subscribe();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => {
                        if out_tx.send(payload).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Broadcast subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        out_rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn segment_bus_filters_by_room() {
        let bus = SegmentBus::new(8);
        let mut rx = bus.subscribe_room("room1");

        bus.publish(TranscriptSegment::finalized("room2", "bob", "ignored", "en-US"));
        bus.publish(TranscriptSegment::finalized("room1", "alice", "seen", "en-US"));

        match rx.recv().await.unwrap() {
            SegmentEvent::Inserted(seg) => assert_eq!(seg.text, "seen"),
            SegmentEvent::Lagged(_) => panic!("unexpected lag"),
        }
    }

    #[tokio::test]
    async fn loopback_delivers_to_all_subscribers() {
        let chan = LoopbackBroadcast::new(8);
        let mut rx1 = chan.subscribe();
        let mut rx2 = chan.subscribe();

        chan.publish("alice", b"hello".to_vec()).unwrap();

        let p1 = rx1.recv().await.unwrap();
        let p2 = rx2.recv().await.unwrap();
        assert_eq!(p1.sender_id, "alice");
        assert_eq!(p1.data, b"hello");
        assert_eq!(p2.data, b"hello");
    }

    #[tokio::test]
    async fn loopback_preserves_per_sender_order() {
        let chan = LoopbackBroadcast::new(8);
        let mut rx = chan.subscribe();

        chan.publish("alice", b"one".to_vec()).unwrap();
        chan.publish("alice", b"two".to_vec()).unwrap();

        assert_eq!(rx.recv().await.unwrap().data, b"one");
        assert_eq!(rx.recv().await.unwrap().data, b"two");
    }
}
