//! Broadcast channel trait definition.
//!
//! Models the session transport's data channel: reliable, ordered per
//! sender (not globally ordered) delivery of opaque byte payloads to all
//! session members. Carries serialized
//! [`TranslationMessage`](crate::domain::TranslationMessage)s.

use tokio::sync::mpsc;

use super::StoreError;

/// A payload received from the broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastPayload {
    /// Identity of the sending participant.
    pub sender_id: String,

    /// Opaque message bytes.
    pub data: Vec<u8>,
}

/// Reliable fanout of opaque byte payloads to all session members.
///
/// Implementations deliver to every subscriber, including one belonging to
/// the sender; receivers filter by `sender_id`.
pub trait BroadcastChannel: Send + Sync {
    /// Publish a payload to all members.
    fn publish(&self, sender_id: &str, data: Vec<u8>) -> Result<(), StoreError>;

    /// Subscribe to all payloads published from now on.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<BroadcastPayload>;
}
