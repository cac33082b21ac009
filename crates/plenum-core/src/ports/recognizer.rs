//! Local speech recognizer trait definition.
//!
//! The recognizer is an external streaming capability producing
//! `(text, is_final)` events in the local language. It is restartable and
//! may fail with "permission denied" or "network error" — both are surfaced
//! as non-fatal status, never a crash of the capture loop.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Why a recognizer session failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerErrorKind {
    /// Microphone or speech permission denied. Not retryable.
    PermissionDenied,

    /// Transient network failure. The capture loop may auto-restart.
    Network,
}

/// A recognizer session failure.
#[derive(Debug, Clone, Error)]
#[error("recognizer error ({kind:?}): {message}")]
pub struct RecognizerError {
    /// Failure class, which decides the restart policy.
    pub kind: RecognizerErrorKind,

    /// Backend-provided detail for logs and status display.
    pub message: String,
}

impl RecognizerError {
    /// Convenience constructor.
    #[must_use]
    pub fn new(kind: RecognizerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One event from a running recognizer session.
#[derive(Debug, Clone)]
pub enum RecognizerEvent {
    /// A recognition result. Interim results (`is_final == false`) are
    /// shown locally only; finals are persisted and broadcast.
    Result {
        /// Recognized text so far (interim) or the finalized utterance.
        text: String,
        /// Whether this result is finalized.
        is_final: bool,
    },

    /// The session failed. The stream ends after this event.
    Error(RecognizerError),

    /// The session ended on its own (end of speech, backend timeout).
    Ended,
}

/// Streaming speech recognizer for the local participant.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Start a recognition session in `language`.
    ///
    /// Returns the event stream for this session. Starting may itself fail
    /// (e.g. permission denied before any audio is captured).
    async fn start(
        &self,
        language: &str,
    ) -> Result<mpsc::UnboundedReceiver<RecognizerEvent>, RecognizerError>;

    /// Stop the current session, if any. Idempotent.
    async fn stop(&self);
}
