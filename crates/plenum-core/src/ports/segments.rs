//! Transcript segment persistence and the at-least-once notification stream.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::StoreError;
use crate::domain::TranscriptSegment;

/// Insert-only repository for finalized transcript segments.
#[async_trait]
pub trait SegmentRepository: Send + Sync {
    /// Persist one finalized segment. Implementations push the inserted row
    /// to the notification stream after a successful write.
    async fn insert(&self, segment: &TranscriptSegment) -> Result<(), StoreError>;

    /// Most recent segments for a room, newest first.
    async fn list_for_room(
        &self,
        room_id: &str,
        limit: u32,
    ) -> Result<Vec<TranscriptSegment>, StoreError>;
}

/// One delivery on the segment notification stream.
#[derive(Debug, Clone)]
pub enum SegmentEvent {
    /// A newly inserted segment. Delivery is at-least-once; ordering is
    /// only guaranteed per originator, never across originators.
    Inserted(TranscriptSegment),

    /// The subscriber fell behind and `missed` insertions were dropped.
    /// Consumers degrade to local-only captions rather than fail.
    Lagged(u64),
}

/// Push stream of newly inserted segments, filterable by room.
pub trait SegmentNotifications: Send + Sync {
    /// Subscribe to insertions for one room.
    ///
    /// The receiver yields events until the notification source is dropped.
    fn subscribe(&self, room_id: &str) -> mpsc::UnboundedReceiver<SegmentEvent>;
}
