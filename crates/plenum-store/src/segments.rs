//! `SQLite` implementation of the `SegmentRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use plenum_core::domain::TranscriptSegment;
use plenum_core::ports::{SegmentRepository, StoreError};

use crate::bus::SegmentBus;
use crate::map_sqlx;

/// `SQLite` implementation of the `SegmentRepository` trait.
///
/// Insert-only: segments are persisted once per finalized sentence unit and
/// never mutated. When a [`SegmentBus`] is attached, every successful
/// insert is pushed to it, giving subscribers the at-least-once
/// notification stream.
pub struct SqliteSegmentRepository {
    pool: SqlitePool,
    bus: Option<SegmentBus>,
}

impl SqliteSegmentRepository {
    /// Create a repository without a notification bus.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool, bus: None }
    }

    /// Attach the notification bus inserts are pushed to.
    #[must_use]
    pub fn with_bus(mut self, bus: SegmentBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Ensure the segment table exists.
    pub async fn ensure_table(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS transcript_segments (
                id TEXT PRIMARY KEY NOT NULL,
                room_id TEXT NOT NULL,
                speaker_id TEXT NOT NULL,
                text TEXT NOT NULL,
                language TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                is_final INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_segments_room ON transcript_segments (room_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }
}

fn segment_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<TranscriptSegment, StoreError> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| StoreError::Storage(format!("invalid segment id {id}: {e}")))?;

    let ms: i64 = row.get("created_at");
    let created_at = DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Storage(format!("invalid segment timestamp: {ms}")))?;

    let is_final: i64 = row.get("is_final");

    Ok(TranscriptSegment {
        id,
        room_id: row.get("room_id"),
        speaker_id: row.get("speaker_id"),
        text: row.get("text"),
        language: row.get("language"),
        created_at,
        is_final: is_final != 0,
    })
}

#[async_trait]
impl SegmentRepository for SqliteSegmentRepository {
    async fn insert(&self, segment: &TranscriptSegment) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO transcript_segments
                (id, room_id, speaker_id, text, language, created_at, is_final)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(segment.id.to_string())
        .bind(&segment.room_id)
        .bind(&segment.speaker_id)
        .bind(&segment.text)
        .bind(&segment.language)
        .bind(segment.created_at.timestamp_millis())
        .bind(i64::from(segment.is_final))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if let Some(ref bus) = self.bus {
            bus.publish(segment.clone());
        }

        Ok(())
    }

    async fn list_for_room(
        &self,
        room_id: &str,
        limit: u32,
    ) -> Result<Vec<TranscriptSegment>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT id, room_id, speaker_id, text, language, created_at, is_final
            FROM transcript_segments
            WHERE room_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            ",
        )
        .bind(room_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.iter().map(segment_from_row).collect()
    }
}
