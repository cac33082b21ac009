//! Finalized transcript segments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One finalized utterance unit, split on sentence boundaries before
/// persistence.
///
/// Segments are insert-only: persisted once per finalized unit, never
/// mutated, retained for the session lifetime. Partial recognizer output is
/// shown locally only and never becomes a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    /// Unique segment id.
    pub id: Uuid,

    /// Room the segment was spoken in.
    pub room_id: String,

    /// Identity of the speaker (the floor holder at capture time).
    pub speaker_id: String,

    /// The finalized text of this sentence unit.
    pub text: String,

    /// Source language code as configured by the speaker (e.g. `"en-US"`).
    pub language: String,

    /// Persistence timestamp.
    pub created_at: DateTime<Utc>,

    /// Always true for persisted segments; carried so the capture layer can
    /// use the same type for interim results it surfaces locally.
    pub is_final: bool,
}

impl TranscriptSegment {
    /// Build a finalized segment with a fresh id and the current time.
    #[must_use]
    pub fn finalized(
        room_id: impl Into<String>,
        speaker_id: impl Into<String>,
        text: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id: room_id.into(),
            speaker_id: speaker_id.into(),
            text: text.into(),
            language: language.into(),
            created_at: Utc::now(),
            is_final: true,
        }
    }
}
