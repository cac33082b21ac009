//! Integration tests for the floor lease protocol over a real (in-memory
//! `SQLite`) lock store.
//!
//! # What is tested
//!
//! - The per-room state machine as observed by a single client
//! - Stale leases are always reported unlocked and lazily removed
//! - Release only removes the row when the caller is the holder
//! - Two-client claim contention (one winner, `FloorBusy` for the other)

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use plenum_core::{FloorError, FloorManager, FloorView, LockStore};
use plenum_store::{SqliteLockStore, setup_test_database};

async fn manager() -> (FloorManager, Arc<SqliteLockStore>) {
    let pool = setup_test_database().await;
    let store = Arc::new(SqliteLockStore::new(pool));
    (FloorManager::new(Arc::clone(&store) as Arc<dyn LockStore>), store)
}

/// Seed a lock row whose lease is `secs_ago` seconds old.
async fn seed_lock(store: &SqliteLockStore, room: &str, holder: &str, secs_ago: i64) {
    let at = Utc::now() - chrono::Duration::seconds(secs_ago);
    store
        .try_claim(room, holder, at, at - chrono::Duration::seconds(120))
        .await
        .unwrap();
}

#[tokio::test]
async fn claim_on_empty_table_succeeds_then_second_client_sees_busy() {
    // End-to-end scenario: X claims an empty table, Y is refused with X's id.
    let (manager, _store) = manager().await;

    manager.claim("room1", "X").await.unwrap();

    let err = manager.claim("room1", "Y").await.unwrap_err();
    match err {
        FloorError::FloorBusy { holder_id } => assert_eq!(holder_id, "X"),
        other => panic!("expected FloorBusy, got {other:?}"),
    }
}

#[tokio::test]
async fn three_minute_old_lease_reads_unlocked_and_row_is_removed() {
    let (manager, store) = manager().await;
    seed_lock(&store, "room1", "X", 180).await;

    let status = manager.status("room1").await.unwrap();
    assert!(!status.locked);
    assert!(status.holder_id.is_none());

    // Lazy cleanup removed the row
    assert!(store.get("room1").await.unwrap().is_none());
}

#[tokio::test]
async fn fresh_lease_reads_locked_with_holder() {
    let (manager, store) = manager().await;
    seed_lock(&store, "room1", "X", 10).await;

    let status = manager.status("room1").await.unwrap();
    assert!(status.locked);
    assert_eq!(status.holder_id.as_deref(), Some("X"));
}

#[tokio::test]
async fn release_by_non_holder_leaves_row_unchanged() {
    let (manager, store) = manager().await;
    seed_lock(&store, "room1", "X", 10).await;

    manager.release("room1", "Y").await.unwrap();

    let lock = store.get("room1").await.unwrap().unwrap();
    assert_eq!(lock.holder_id, "X");
}

#[tokio::test]
async fn state_machine_claim_heartbeat_release() {
    let (manager, _store) = manager().await;

    // Unlocked
    assert_eq!(manager.view("room1", "X").await.unwrap(), FloorView::Unlocked);

    // Unlocked -> (claim success) -> HeldBySelf
    manager.claim("room1", "X").await.unwrap();
    assert_eq!(manager.view("room1", "X").await.unwrap(), FloorView::HeldBySelf);

    // HeldBySelf -> (heartbeat) -> HeldBySelf
    assert!(manager.heartbeat("room1", "X").await.unwrap());
    assert_eq!(manager.view("room1", "X").await.unwrap(), FloorView::HeldBySelf);

    // HeldBySelf -> (release) -> Unlocked
    manager.release("room1", "X").await.unwrap();
    assert_eq!(manager.view("room1", "X").await.unwrap(), FloorView::Unlocked);
}

#[tokio::test]
async fn other_holder_is_observed_as_held_by_other() {
    let (manager, _store) = manager().await;

    manager.claim("room1", "X").await.unwrap();
    assert_eq!(
        manager.view("room1", "Y").await.unwrap(),
        FloorView::HeldByOther {
            holder_id: "X".to_string()
        }
    );
}

#[tokio::test]
async fn heartbeat_after_lease_lost_reports_false() {
    let (manager, store) = manager().await;

    manager.claim("room1", "X").await.unwrap();
    // Simulate another client reclaiming over a stale lease.
    store.delete("room1").await.unwrap();
    manager.claim("room1", "Y").await.unwrap();

    assert!(!manager.heartbeat("room1", "X").await.unwrap());
    assert_eq!(
        manager.view("room1", "X").await.unwrap(),
        FloorView::HeldByOther {
            holder_id: "Y".to_string()
        }
    );
}

#[tokio::test]
async fn reentrant_claim_always_succeeds() {
    let (manager, _store) = manager().await;

    manager.claim("room1", "X").await.unwrap();
    manager.claim("room1", "X").await.unwrap();
    assert_eq!(manager.view("room1", "X").await.unwrap(), FloorView::HeldBySelf);
}

#[tokio::test]
async fn claim_over_stale_holder_succeeds() {
    let pool = setup_test_database().await;
    let store = Arc::new(SqliteLockStore::new(pool));
    // 1-second threshold so the seeded lease is already stale.
    let manager = FloorManager::with_stale_threshold(
        Arc::clone(&store) as Arc<dyn LockStore>,
        Duration::from_secs(1),
    );
    seed_lock(&store, "room1", "X", 5).await;

    manager.claim("room1", "Y").await.unwrap();
    assert_eq!(manager.view("room1", "Y").await.unwrap(), FloorView::HeldBySelf);
}

#[tokio::test]
async fn reset_all_clears_every_room() {
    let (manager, store) = manager().await;
    manager.claim("room1", "X").await.unwrap();
    manager.claim("room2", "Y").await.unwrap();

    assert_eq!(manager.reset_all().await.unwrap(), 2);
    assert!(store.get("room1").await.unwrap().is_none());
    assert!(store.get("room2").await.unwrap().is_none());
}
