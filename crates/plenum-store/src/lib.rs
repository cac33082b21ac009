#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unsafe_code)]

pub mod bus;
pub mod lock_store;
pub mod segments;
pub mod setup;

pub use bus::{LoopbackBroadcast, SegmentBus};
pub use lock_store::SqliteLockStore;
pub use segments::SqliteSegmentRepository;
pub use setup::setup_database;
// Pool type for callers that wire repositories themselves.
pub use sqlx::SqlitePool;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;

/// Map a sqlx error to the port-level store error.
///
/// Connection-level failures become `Unavailable` (callers fail closed);
/// everything else is a `Storage` error.
pub(crate) fn map_sqlx(e: sqlx::Error) -> plenum_core::StoreError {
    use plenum_core::StoreError;

    match e {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Storage(other.to_string()),
    }
}
