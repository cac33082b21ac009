//! The floor lock — one row per room, at most one non-expired holder.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A lease on the floor of a room.
///
/// The lock is *best-effort* single-writer state in a shared store: every
/// client treats it as the single source of truth, and a holder that stops
/// renewing the lease is reclaimed via staleness (see
/// [`FloorManager`](crate::floor::FloorManager)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorLock {
    /// Room this lock belongs to (primary key in the store).
    pub room_id: String,

    /// Identity of the current holder.
    pub holder_id: String,

    /// Last time the lease was claimed or renewed.
    pub lease_updated_at: DateTime<Utc>,
}

impl FloorLock {
    /// Age of the lease relative to `now`.
    ///
    /// Clock skew can make the lease appear to be from the future; that is
    /// clamped to zero so a skewed writer is never treated as stale.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.lease_updated_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the lease has outlived `threshold` as of `now`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.age(now) >= threshold
    }
}

/// Floor state of a room as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorStatus {
    /// Whether a non-expired holder exists.
    pub locked: bool,

    /// The holder's identity, when locked.
    pub holder_id: Option<String>,
}

impl FloorStatus {
    /// Status of a room with no active holder.
    #[must_use]
    pub const fn unlocked() -> Self {
        Self {
            locked: false,
            holder_id: None,
        }
    }

    /// Status of a room held by `holder_id`.
    #[must_use]
    pub fn held_by(holder_id: impl Into<String>) -> Self {
        Self {
            locked: true,
            holder_id: Some(holder_id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_at(secs_ago: i64) -> FloorLock {
        FloorLock {
            room_id: "room1".to_string(),
            holder_id: "alice".to_string(),
            lease_updated_at: Utc::now() - chrono::Duration::seconds(secs_ago),
        }
    }

    #[test]
    fn fresh_lease_is_not_stale() {
        let lock = lock_at(10);
        assert!(!lock.is_stale(Utc::now(), Duration::from_secs(120)));
    }

    #[test]
    fn old_lease_is_stale() {
        let lock = lock_at(180);
        assert!(lock.is_stale(Utc::now(), Duration::from_secs(120)));
    }

    #[test]
    fn future_lease_age_clamps_to_zero() {
        let lock = lock_at(-60);
        assert_eq!(lock.age(Utc::now()), Duration::ZERO);
    }
}
