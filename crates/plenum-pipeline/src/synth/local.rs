//! On-device synthesis backend.
//!
//! Wraps a blocking voice engine (the platform speech synthesizer) behind
//! the async [`SynthBackend`] contract. Rendering runs on the blocking
//! thread pool so the queue workers are never stalled by engine calls.

use std::sync::Arc;

use async_trait::async_trait;

use plenum_core::domain::primary_subtag;

use crate::error::PipelineError;
use crate::synth::SynthBackend;

// ── Engine abstraction ─────────────────────────────────────────────

/// One voice offered by the on-device engine.
#[derive(Debug, Clone)]
pub struct EngineVoice {
    /// Engine-assigned voice identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// BCP 47 tag of the voice, e.g. `"fr-CA"`.
    pub language: String,
}

/// Blocking on-device voice engine.
///
/// Both methods may block on engine internals; [`LocalSynth`] calls them
/// via `spawn_blocking` only.
pub trait VoiceEngine: Send + Sync + 'static {
    /// Voices currently installed on the device.
    fn voices(&self) -> Vec<EngineVoice>;

    /// Render `text` with the given voice to encoded audio.
    ///
    /// An empty buffer means the engine produced no audio for this input.
    fn render(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, String>;
}

// ── Backend ────────────────────────────────────────────────────────

/// [`SynthBackend`] over an on-device [`VoiceEngine`].
pub struct LocalSynth {
    engine: Arc<dyn VoiceEngine>,
}

impl LocalSynth {
    /// Wrap an engine.
    #[must_use]
    pub fn new(engine: Arc<dyn VoiceEngine>) -> Self {
        Self { engine }
    }

    /// Best-effort voice selection for `language`.
    ///
    /// Exact tag match first, then primary-subtag match (`"fr-CA"` serves
    /// `"fr-FR"`), then the engine's first voice. `None` only when the
    /// engine has no voices at all.
    fn pick_voice(&self, language: &str) -> Option<EngineVoice> {
        let voices = self.engine.voices();
        let subtag = primary_subtag(language);

        voices
            .iter()
            .find(|v| v.language == language)
            .or_else(|| voices.iter().find(|v| primary_subtag(&v.language) == subtag))
            .or_else(|| voices.first())
            .cloned()
    }
}

#[async_trait]
impl SynthBackend for LocalSynth {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, PipelineError> {
        let Some(voice) = self.pick_voice(language) else {
            tracing::debug!(language, "No on-device voices installed");
            return Ok(Vec::new());
        };

        tracing::debug!(language, voice = %voice.name, "Rendering on-device");

        let engine = Arc::clone(&self.engine);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || engine.render(&text, &voice.id))
            .await
            .map_err(|e| PipelineError::SynthesisFailed(format!("render task: {e}")))?
            .map_err(PipelineError::SynthesisFailed)
    }
}
