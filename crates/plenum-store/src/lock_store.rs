//! `SQLite` implementation of the `LockStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use plenum_core::domain::FloorLock;
use plenum_core::ports::{ClaimOutcome, LockStore, StoreError};

use crate::map_sqlx;

/// `SQLite` implementation of the `LockStore` trait.
///
/// One row per room. Lease timestamps are stored as integer Unix
/// milliseconds so the staleness predicate can run inside the claim
/// statement itself.
pub struct SqliteLockStore {
    pool: SqlitePool,
}

impl SqliteLockStore {
    /// Create a new `SQLite` lock store.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensure the lock table exists.
    ///
    /// Call this during initialization to set up the schema.
    pub async fn ensure_table(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS floor_locks (
                room_id TEXT PRIMARY KEY NOT NULL,
                holder_id TEXT NOT NULL,
                lease_updated_at INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    /// One atomic conditional upsert. Affects a row only when the room is
    /// unclaimed, already ours, or the existing lease is stale.
    async fn claim_statement(
        &self,
        room_id: &str,
        holder_id: &str,
        now_ms: i64,
        stale_before_ms: i64,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r"
            INSERT INTO floor_locks (room_id, holder_id, lease_updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(room_id) DO UPDATE SET
                holder_id = excluded.holder_id,
                lease_updated_at = excluded.lease_updated_at
            WHERE floor_locks.holder_id = excluded.holder_id
               OR floor_locks.lease_updated_at <= ?
            ",
        )
        .bind(room_id)
        .bind(holder_id)
        .bind(now_ms)
        .bind(stale_before_ms)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(result.rows_affected())
    }
}

fn lock_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<FloorLock, StoreError> {
    let ms: i64 = row.get("lease_updated_at");
    let lease_updated_at = DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Storage(format!("invalid lease timestamp: {ms}")))?;

    Ok(FloorLock {
        room_id: row.get("room_id"),
        holder_id: row.get("holder_id"),
        lease_updated_at,
    })
}

#[async_trait]
impl LockStore for SqliteLockStore {
    async fn get(&self, room_id: &str) -> Result<Option<FloorLock>, StoreError> {
        let row = sqlx::query(
            "SELECT room_id, holder_id, lease_updated_at FROM floor_locks WHERE room_id = ?",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.as_ref().map(lock_from_row).transpose()
    }

    async fn try_claim(
        &self,
        room_id: &str,
        holder_id: &str,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StoreError> {
        let now_ms = now.timestamp_millis();
        let stale_ms = stale_before.timestamp_millis();

        if self
            .claim_statement(room_id, holder_id, now_ms, stale_ms)
            .await?
            == 1
        {
            return Ok(ClaimOutcome::Granted);
        }

        // Rejected: read the winner for the error report. If the row was
        // deleted between the two statements (a release racing us), one
        // more attempt settles it.
        match self.get(room_id).await? {
            Some(lock) => Ok(ClaimOutcome::Rejected {
                holder_id: lock.holder_id,
            }),
            None => {
                if self
                    .claim_statement(room_id, holder_id, now_ms, stale_ms)
                    .await?
                    == 1
                {
                    Ok(ClaimOutcome::Granted)
                } else {
                    let holder_id = self
                        .get(room_id)
                        .await?
                        .map_or_else(String::new, |l| l.holder_id);
                    Ok(ClaimOutcome::Rejected { holder_id })
                }
            }
        }
    }

    async fn touch(
        &self,
        room_id: &str,
        holder_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE floor_locks SET lease_updated_at = ? WHERE room_id = ? AND holder_id = ?",
        )
        .bind(now.timestamp_millis())
        .bind(room_id)
        .bind(holder_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_if_holder(&self, room_id: &str, holder_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM floor_locks WHERE room_id = ? AND holder_id = ?")
            .bind(room_id)
            .bind(holder_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, room_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM floor_locks WHERE room_id = ?")
            .bind(room_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(())
    }

    async fn clear_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM floor_locks")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;

    async fn store() -> SqliteLockStore {
        let pool = setup_test_database().await;
        SqliteLockStore::new(pool)
    }

    fn stale_before(now: DateTime<Utc>) -> DateTime<Utc> {
        now - chrono::Duration::seconds(120)
    }

    #[tokio::test]
    async fn claim_on_empty_room_is_granted() {
        let store = store().await;
        let now = Utc::now();

        let outcome = store
            .try_claim("room1", "alice", now, stale_before(now))
            .await
            .unwrap();
        assert_eq!(outcome, ClaimOutcome::Granted);

        let lock = store.get("room1").await.unwrap().unwrap();
        assert_eq!(lock.holder_id, "alice");
    }

    #[tokio::test]
    async fn claim_against_fresh_holder_is_rejected() {
        let store = store().await;
        let now = Utc::now();

        store
            .try_claim("room1", "alice", now, stale_before(now))
            .await
            .unwrap();
        let outcome = store
            .try_claim("room1", "bob", now, stale_before(now))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ClaimOutcome::Rejected {
                holder_id: "alice".to_string()
            }
        );
        // Loser did not overwrite the row
        let lock = store.get("room1").await.unwrap().unwrap();
        assert_eq!(lock.holder_id, "alice");
    }

    #[tokio::test]
    async fn reentrant_claim_refreshes_lease() {
        let store = store().await;
        let t0 = Utc::now() - chrono::Duration::seconds(30);
        let t1 = Utc::now();

        store
            .try_claim("room1", "alice", t0, stale_before(t0))
            .await
            .unwrap();
        let outcome = store
            .try_claim("room1", "alice", t1, stale_before(t1))
            .await
            .unwrap();
        assert_eq!(outcome, ClaimOutcome::Granted);

        let lock = store.get("room1").await.unwrap().unwrap();
        assert_eq!(lock.lease_updated_at.timestamp_millis(), t1.timestamp_millis());
    }

    #[tokio::test]
    async fn claim_over_stale_holder_is_granted() {
        let store = store().await;
        let old = Utc::now() - chrono::Duration::seconds(180);
        let now = Utc::now();

        store
            .try_claim("room1", "alice", old, stale_before(old))
            .await
            .unwrap();
        let outcome = store
            .try_claim("room1", "bob", now, stale_before(now))
            .await
            .unwrap();
        assert_eq!(outcome, ClaimOutcome::Granted);

        let lock = store.get("room1").await.unwrap().unwrap();
        assert_eq!(lock.holder_id, "bob");
    }

    #[tokio::test]
    async fn touch_renews_only_for_holder() {
        let store = store().await;
        let now = Utc::now();
        store
            .try_claim("room1", "alice", now, stale_before(now))
            .await
            .unwrap();

        assert!(store.touch("room1", "alice", Utc::now()).await.unwrap());
        assert!(!store.touch("room1", "bob", Utc::now()).await.unwrap());
        assert!(!store.touch("nowhere", "alice", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn delete_if_holder_ignores_non_holder() {
        let store = store().await;
        let now = Utc::now();
        store
            .try_claim("room1", "alice", now, stale_before(now))
            .await
            .unwrap();

        assert!(!store.delete_if_holder("room1", "bob").await.unwrap());
        assert!(store.get("room1").await.unwrap().is_some());

        assert!(store.delete_if_holder("room1", "alice").await.unwrap());
        assert!(store.get("room1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_all_counts_rows() {
        let store = store().await;
        let now = Utc::now();
        store
            .try_claim("room1", "alice", now, stale_before(now))
            .await
            .unwrap();
        store
            .try_claim("room2", "bob", now, stale_before(now))
            .await
            .unwrap();

        assert_eq!(store.clear_all().await.unwrap(), 2);
        assert!(store.get("room1").await.unwrap().is_none());
    }
}
