//! Speech synthesis backend trait and implementations.
//!
//! The pipeline operates on `Arc<dyn SynthBackend>` so backends can be
//! swapped without touching queue logic. Which backend a session uses is
//! chosen by [`SynthBackendKind`](plenum_core::SynthBackendKind) at wiring
//! time.
//!
//! | Kind     | Module     | Engine                              |
//! |----------|------------|-------------------------------------|
//! | `Local`  | [`local`]  | On-device voice engine (blocking)   |
//! | `Remote` | [`remote`] | Hosted HTTP bytes endpoint          |

pub mod local;
pub mod remote;

pub use local::{EngineVoice, LocalSynth, VoiceEngine};
pub use remote::{RemoteSynth, RemoteSynthConfig};

use async_trait::async_trait;

use crate::error::PipelineError;

/// Backend-agnostic speech synthesizer.
///
/// Implementations must be `Send + Sync` so the translation worker can hold
/// them across `.await` points.
#[async_trait]
pub trait SynthBackend: Send + Sync {
    /// Synthesize `text` spoken in `language` (a BCP 47 tag).
    ///
    /// Returns encoded audio ready for an
    /// [`AudioPlayer`](crate::playback::AudioPlayer). An **empty** buffer is
    /// a successful "no audio produced" outcome (no matching voice, silent
    /// input); the item stays text-only and is not an error.
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, PipelineError>;
}
