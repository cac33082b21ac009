#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unsafe_code)]

pub mod capture;
pub mod ducking;
pub mod error;
pub mod pipeline;
pub mod playback;
pub mod session;
pub mod synth;
pub mod text;
pub mod translate;

// Re-export key types for convenience
pub use capture::{CaptureConfig, CaptureEvent, CaptureLoop};
pub use ducking::{Ducker, MediaOutputs, RawAudioGate};
pub use error::PipelineError;
pub use pipeline::{PipelineConfig, PipelineEvent, TranslationItem, TranslationPipeline};
pub use playback::AudioPlayer;
pub use session::{Session, SessionConfig, SessionEvent, SessionPorts, StopReason};
pub use synth::{EngineVoice, LocalSynth, RemoteSynth, RemoteSynthConfig, SynthBackend, VoiceEngine};
pub use translate::{HttpTranslator, Translator, TranslatorConfig};
