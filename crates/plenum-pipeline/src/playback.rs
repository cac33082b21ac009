//! Audio playback port.

use async_trait::async_trait;

use crate::error::PipelineError;

/// Plays one encoded utterance to completion.
///
/// The playback queue relies on `play` resolving only when the audio has
/// finished (or failed to decode) — that is what serializes utterances and
/// bounds the ducking window. Implementations must not return early while
/// audio is still audible.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Decode and play `audio`, resolving at end of playback.
    ///
    /// Decode failures and device errors reject with
    /// [`PipelineError::PlaybackFailed`]; the queue logs, restores ducked
    /// volumes, and moves on to the next utterance.
    async fn play(&self, audio: &[u8]) -> Result<(), PipelineError>;
}
