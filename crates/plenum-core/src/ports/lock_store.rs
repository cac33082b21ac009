//! Lock store trait definition.
//!
//! The store holds one [`FloorLock`] row per room. The critical operation
//! is [`LockStore::try_claim`], which must be a single atomic conditional
//! write — the check-then-act race of separate read and write calls is
//! exactly what this port exists to rule out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::StoreError;
use crate::domain::FloorLock;

/// Result of an atomic claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The caller now holds the floor with a fresh lease.
    Granted,

    /// A different, non-stale holder exists.
    Rejected {
        /// The current holder at rejection time (best-effort read; may
        /// already be outdated when observed).
        holder_id: String,
    },
}

/// Shared store for floor locks, one row per room.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Read the lock row for a room, if any.
    async fn get(&self, room_id: &str) -> Result<Option<FloorLock>, StoreError>;

    /// Atomically claim the floor for `holder_id`.
    ///
    /// Must succeed — in one conditional write, with no separate read —
    /// when any of these hold:
    /// - no row exists for the room,
    /// - the existing row's holder is `holder_id` (re-entrant refresh),
    /// - the existing lease is at or before `stale_before`.
    ///
    /// On success the row carries `holder_id` and `now`.
    async fn try_claim(
        &self,
        room_id: &str,
        holder_id: &str,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StoreError>;

    /// Renew the lease if and only if `holder_id` is the current holder.
    ///
    /// Returns `true` when the lease was renewed, `false` when the caller
    /// is no longer the holder (lease lost).
    async fn touch(
        &self,
        room_id: &str,
        holder_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Delete the row if and only if `holder_id` is the current holder.
    ///
    /// Returns `true` when a row was removed. A mismatched holder leaves
    /// the row unchanged — a client may never release another's lock.
    async fn delete_if_holder(&self, room_id: &str, holder_id: &str) -> Result<bool, StoreError>;

    /// Unconditionally delete the row (stale-lease cleanup).
    async fn delete(&self, room_id: &str) -> Result<(), StoreError>;

    /// Delete every lock row. Operator escape hatch; returns rows removed.
    async fn clear_all(&self) -> Result<u64, StoreError>;
}
