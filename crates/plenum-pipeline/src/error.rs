//! Pipeline error types.

use plenum_core::{FloorError, RecognizerError, StoreError};

/// Errors that can occur in the translation/playback pipeline and the
/// session orchestrator.
///
/// All of these are non-fatal to the session: translation failures fall
/// back to the original text, synthesis failures degrade an item to
/// text-only, and floor/store failures surface as status.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The translation service returned a non-success status or a payload
    /// that could not be parsed.
    #[error("Translation failed: {0}")]
    TranslationFailed(String),

    /// The synthesis backend failed to produce audio.
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Decoding or playing a synthesized utterance failed.
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// The speech recognizer failed to start or aborted.
    #[error(transparent)]
    Recognizer(#[from] RecognizerError),

    /// A floor protocol operation failed (busy floor, store outage).
    #[error(transparent)]
    Floor(#[from] FloorError),

    /// The shared store rejected a read or write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A session lifecycle operation was called in the wrong state.
    #[error("Session is already speaking")]
    AlreadySpeaking,
}
