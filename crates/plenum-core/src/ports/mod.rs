//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the core protocol expects from
//! infrastructure: the shared lock/segment store, its push notification
//! stream, the broadcast transport, and the local speech recognizer.
//!
//! # Design Rules
//!
//! - No `sqlx` or `reqwest` types in any signature
//! - Traits are minimal and intent-based
//! - All operations are fallible; callers decide how to degrade

pub mod broadcast;
pub mod lock_store;
pub mod recognizer;
pub mod segments;

use thiserror::Error;

pub use broadcast::{BroadcastChannel, BroadcastPayload};
pub use lock_store::{ClaimOutcome, LockStore};
pub use recognizer::{Recognizer, RecognizerError, RecognizerErrorKind, RecognizerEvent};
pub use segments::{SegmentEvent, SegmentNotifications, SegmentRepository};

/// Errors surfaced by store-backed ports.
///
/// Implementations map their backend errors into these variants; the
/// distinction matters because callers fail closed on `Unavailable` but may
/// treat `Storage` (e.g. a malformed row) as data to skip.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached (network, pool exhausted, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the operation or returned malformed data.
    #[error("storage error: {0}")]
    Storage(String),
}
