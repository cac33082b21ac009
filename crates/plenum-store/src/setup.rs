//! Database creation and schema setup.

use std::path::Path;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

use plenum_core::ports::StoreError;

use crate::lock_store::SqliteLockStore;
use crate::map_sqlx;
use crate::segments::SqliteSegmentRepository;

/// Open (creating if missing) the shared database at `path` and ensure the
/// schema exists.
pub async fn setup_database(path: &Path) -> Result<SqlitePool, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("create {}: {e}", parent.display())))?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await.map_err(map_sqlx)?;
    ensure_schema(&pool).await?;

    tracing::debug!(path = %path.display(), "Database ready");
    Ok(pool)
}

/// Create all tables used by this crate.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    SqliteLockStore::new(pool.clone()).ensure_table().await?;
    SqliteSegmentRepository::new(pool.clone())
        .ensure_table()
        .await?;
    Ok(())
}

/// In-memory database for tests.
///
/// Capped at one connection: a pooled in-memory `SQLite` would otherwise
/// hand each connection its own empty database.
#[cfg(any(test, feature = "test-utils"))]
pub async fn setup_test_database() -> SqlitePool {
    use std::str::FromStr;

    let options =
        SqliteConnectOptions::from_str("sqlite::memory:").expect("in-memory sqlite options");
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory sqlite pool");
    ensure_schema(&pool).await.expect("schema setup");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn creates_database_file_and_schema_on_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("plenum.db");

        let pool = tokio_test::assert_ok!(setup_database(&path).await);
        assert!(path.exists());

        // Schema is queryable right away.
        tokio_test::assert_ok!(
            sqlx::query("SELECT COUNT(*) FROM floor_locks")
                .fetch_one(&pool)
                .await
        );

        // Reopening an existing database is a no-op, not an error.
        tokio_test::assert_ok!(setup_database(&path).await);
    }
}
