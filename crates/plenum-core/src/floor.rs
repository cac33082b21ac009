//! Floor lock manager — the claim / renew / release / expire lease protocol.
//!
//! Exactly one participant per room may hold "the floor" (the right to
//! speak and broadcast) at a time. There is no central lock manager: every
//! client runs this protocol against the shared [`LockStore`] and treats it
//! as the single source of truth.
//!
//! Per-room state machine, as observed by one client:
//!
//! ```text
//!   Unlocked ──(claim ok)──▶ HeldBySelf ──(heartbeat)──▶ HeldBySelf
//!      ▲                         │
//!      │◀──(release | lease lost)┘
//!      │
//!      └──(claim by other)──▶ HeldByOther ──(stale | release observed)──▶ Unlocked
//! ```
//!
//! Mutual exclusion is best-effort, not linearizable: the claim itself is a
//! single atomic conditional write (see [`LockStore::try_claim`]), and the
//! stale-lease timeout is the only defense against a holder crashing
//! without releasing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::FloorStatus;
use crate::error::FloorError;
use crate::ports::{ClaimOutcome, LockStore};

/// Lease age at which a lock is treated as abandoned.
pub const STALE_THRESHOLD: Duration = Duration::from_secs(120);

/// Floor state of a room relative to one client identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloorView {
    /// No non-expired holder.
    Unlocked,

    /// This client holds the floor.
    HeldBySelf,

    /// Another participant holds the floor.
    HeldByOther {
        /// The other holder's identity.
        holder_id: String,
    },
}

/// Drives the floor lease protocol over a shared lock store.
///
/// All operations are fallible due to store unavailability; callers treat
/// any failure as "could not confirm floor state" and fail closed.
#[derive(Clone)]
pub struct FloorManager {
    store: Arc<dyn LockStore>,
    stale_threshold: Duration,
}

impl FloorManager {
    /// Create a manager with the default [`STALE_THRESHOLD`].
    #[must_use]
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self::with_stale_threshold(store, STALE_THRESHOLD)
    }

    /// Create a manager with a custom stale threshold (tests, tuning).
    #[must_use]
    pub fn with_stale_threshold(store: Arc<dyn LockStore>, stale_threshold: Duration) -> Self {
        Self {
            store,
            stale_threshold,
        }
    }

    /// Report the floor state of a room.
    ///
    /// A lease older than the stale threshold is reported unlocked and the
    /// row is opportunistically deleted. Cleanup failure is non-fatal — the
    /// next reader will also see the row as stale.
    pub async fn status(&self, room_id: &str) -> Result<FloorStatus, FloorError> {
        let Some(lock) = self.store.get(room_id).await? else {
            return Ok(FloorStatus::unlocked());
        };

        if lock.is_stale(Utc::now(), self.stale_threshold) {
            tracing::info!(
                room_id,
                holder_id = %lock.holder_id,
                age_secs = lock.age(Utc::now()).as_secs(),
                "Removing stale floor lock"
            );
            if let Err(e) = self.store.delete(room_id).await {
                tracing::warn!(room_id, error = %e, "Stale lock cleanup failed");
            }
            return Ok(FloorStatus::unlocked());
        }

        Ok(FloorStatus::held_by(lock.holder_id))
    }

    /// Claim the floor for `client_id`.
    ///
    /// Re-entrant: claiming while already the holder succeeds and refreshes
    /// the lease. Fails with [`FloorError::FloorBusy`] when another
    /// participant holds a non-stale lease. The claim is one atomic
    /// conditional write — two racing clients cannot both be granted.
    pub async fn claim(&self, room_id: &str, client_id: &str) -> Result<(), FloorError> {
        let now = Utc::now();
        let stale_before = now
            - chrono::Duration::from_std(self.stale_threshold)
                .unwrap_or_else(|_| chrono::Duration::seconds(120));

        match self
            .store
            .try_claim(room_id, client_id, now, stale_before)
            .await?
        {
            ClaimOutcome::Granted => {
                tracing::info!(room_id, client_id, "Floor claimed");
                Ok(())
            }
            ClaimOutcome::Rejected { holder_id } => {
                tracing::debug!(room_id, client_id, holder_id, "Floor claim rejected");
                Err(FloorError::FloorBusy { holder_id })
            }
        }
    }

    /// Renew the lease while speaking.
    ///
    /// Returns `true` when renewed, `false` when the caller is no longer
    /// the holder — the caller must then stop capture and re-check
    /// [`status`](Self::status).
    pub async fn heartbeat(&self, room_id: &str, client_id: &str) -> Result<bool, FloorError> {
        let renewed = self.store.touch(room_id, client_id, Utc::now()).await?;
        if !renewed {
            tracing::warn!(room_id, client_id, "Heartbeat found no owned lease");
        }
        Ok(renewed)
    }

    /// Release the floor.
    ///
    /// Deletes the row only when it matches `(room_id, holder = client_id)`;
    /// a release by a non-holder leaves the row unchanged.
    pub async fn release(&self, room_id: &str, client_id: &str) -> Result<(), FloorError> {
        let removed = self.store.delete_if_holder(room_id, client_id).await?;
        if removed {
            tracing::info!(room_id, client_id, "Floor released");
        } else {
            tracing::debug!(room_id, client_id, "Release was a no-op (not the holder)");
        }
        Ok(())
    }

    /// The room's floor state relative to `client_id`.
    pub async fn view(&self, room_id: &str, client_id: &str) -> Result<FloorView, FloorError> {
        let status = self.status(room_id).await?;
        Ok(match status.holder_id {
            None => FloorView::Unlocked,
            Some(holder) if holder == client_id => FloorView::HeldBySelf,
            Some(holder_id) => FloorView::HeldByOther { holder_id },
        })
    }

    /// Remove every lock row in the store (operator reset).
    pub async fn reset_all(&self) -> Result<u64, FloorError> {
        let removed = self.store.clear_all().await?;
        tracing::info!(removed, "Cleared all floor locks");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::domain::FloorLock;
    use crate::ports::StoreError;

    /// A store whose every operation fails, for fail-closed behavior.
    struct DownStore;

    #[async_trait]
    impl LockStore for DownStore {
        async fn get(&self, _room_id: &str) -> Result<Option<FloorLock>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn try_claim(
            &self,
            _room_id: &str,
            _holder_id: &str,
            _now: DateTime<Utc>,
            _stale_before: DateTime<Utc>,
        ) -> Result<ClaimOutcome, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn touch(
            &self,
            _room_id: &str,
            _holder_id: &str,
            _now: DateTime<Utc>,
        ) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn delete_if_holder(
            &self,
            _room_id: &str,
            _holder_id: &str,
        ) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn delete(&self, _room_id: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn clear_all(&self) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn claim_fails_closed_when_store_is_down() {
        let manager = FloorManager::new(Arc::new(DownStore));
        let err = manager.claim("room1", "alice").await.unwrap_err();
        assert!(matches!(err, FloorError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn heartbeat_propagates_store_failure() {
        let manager = FloorManager::new(Arc::new(DownStore));
        assert!(manager.heartbeat("room1", "alice").await.is_err());
    }

    #[tokio::test]
    async fn status_propagates_store_failure() {
        let manager = FloorManager::new(Arc::new(DownStore));
        assert!(manager.status("room1").await.is_err());
    }
}
