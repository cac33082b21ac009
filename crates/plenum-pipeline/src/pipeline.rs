//! The listener-side translation and playback pipeline.
//!
//! Two FIFO queues, each drained by a single worker task:
//!
//! ```text
//!   enqueue ─► [translation queue] ─► translate ─► synthesize ─┐
//!                                                              ▼
//!                           duck ◄─ [playback queue] ◄─ audio bytes
//!                             └─► play to completion ─► restore
//! ```
//!
//! The translation worker never drops an item: translation failure falls
//! back to the original text, synthesis failure (or empty audio) degrades
//! the item to text-only. The playback worker keeps at most one utterance
//! in flight and holds the duck only while that utterance plays.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use plenum_core::Settings;

use crate::ducking::{Ducker, MediaOutputs};
use crate::playback::AudioPlayer;
use crate::synth::SynthBackend;
use crate::translate::Translator;

// ── Queue items and events ─────────────────────────────────────────

/// One unit of incoming speech to translate and (optionally) play.
#[derive(Debug, Clone)]
pub struct TranslationItem {
    /// Participant whose speech this is.
    pub speaker_id: String,

    /// Source text awaiting translation.
    pub text: String,
}

impl TranslationItem {
    /// Build an item.
    #[must_use]
    pub fn new(speaker_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            text: text.into(),
        }
    }
}

/// Events emitted by the pipeline to the UI / application layer.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// An item finished the translation step and is ready for display.
    Translated {
        /// Participant whose speech this is.
        speaker_id: String,
        /// Display text (the translation, or the original on fallback).
        text: String,
        /// Whether translation failed and the original text was kept.
        fallback: bool,
    },

    /// Playback of one utterance started (outputs are ducked).
    PlaybackStarted,

    /// Playback of one utterance ended (outputs are restored).
    PlaybackFinished,

    /// One utterance failed to decode or play. The queue continues.
    PlaybackFailed(String),
}

// ── Configuration ──────────────────────────────────────────────────

/// Pipeline wiring parameters, fixed for the lifetime of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Language incoming text is translated into.
    pub target_language: String,

    /// Volume ceiling for other outputs during playback.
    pub duck_level: f32,

    /// Whether items are synthesized and played (toggleable later).
    pub audible: bool,
}

impl From<&Settings> for PipelineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            target_language: settings.target_language.clone(),
            duck_level: settings.duck_level,
            audible: settings.listen_translated,
        }
    }
}

// ── Pipeline ───────────────────────────────────────────────────────

/// Handle to the running worker pair.
///
/// Dropping the handle closes the translation queue; both workers drain
/// what they already hold and exit. Items dequeued before the drop are
/// still completed, matching the rule that disabling listening discards
/// finished work from display rather than aborting it.
pub struct TranslationPipeline {
    item_tx: mpsc::UnboundedSender<TranslationItem>,
    audible: Arc<AtomicBool>,
}

impl TranslationPipeline {
    /// Spawn the translation and playback workers.
    ///
    /// Returns the handle and the event stream. Must be called from within
    /// a tokio runtime.
    #[must_use]
    pub fn spawn(
        translator: Arc<dyn Translator>,
        synth: Arc<dyn SynthBackend>,
        player: Arc<dyn AudioPlayer>,
        outputs: Arc<dyn MediaOutputs>,
        config: PipelineConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (item_tx, item_rx) = mpsc::unbounded_channel::<TranslationItem>();
        let (audio_tx, audio_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<PipelineEvent>();

        let audible = Arc::new(AtomicBool::new(config.audible));

        tokio::spawn(translation_worker(
            item_rx,
            audio_tx,
            event_tx.clone(),
            translator,
            synth,
            Arc::clone(&audible),
            config.target_language,
        ));
        tokio::spawn(playback_worker(
            audio_rx,
            event_tx,
            player,
            outputs,
            config.duck_level,
        ));

        (Self { item_tx, audible }, event_rx)
    }

    /// Enqueue one item. Silently dropped once the pipeline has shut down.
    pub fn enqueue(&self, item: TranslationItem) {
        if self.item_tx.send(item).is_err() {
            tracing::warn!("Translation queue is closed, item dropped");
        }
    }

    /// Toggle synthesis and playback for items dequeued from now on.
    pub fn set_audible(&self, audible: bool) {
        self.audible.store(audible, Ordering::SeqCst);
    }

    /// Whether dequeued items are currently synthesized and played.
    #[must_use]
    pub fn is_audible(&self) -> bool {
        self.audible.load(Ordering::SeqCst)
    }
}

// ── Workers ────────────────────────────────────────────────────────

/// Single consumer of the translation queue.
async fn translation_worker(
    mut item_rx: mpsc::UnboundedReceiver<TranslationItem>,
    audio_tx: mpsc::UnboundedSender<Vec<u8>>,
    event_tx: mpsc::UnboundedSender<PipelineEvent>,
    translator: Arc<dyn Translator>,
    synth: Arc<dyn SynthBackend>,
    audible: Arc<AtomicBool>,
    target_language: String,
) {
    while let Some(item) = item_rx.recv().await {
        let (text, fallback) = match translator.translate(&item.text, &target_language).await {
            Ok(translated) => (translated, false),
            Err(e) => {
                tracing::warn!(
                    speaker = %item.speaker_id,
                    error = %e,
                    "Translation failed, keeping original text"
                );
                (item.text, true)
            }
        };

        let _ = event_tx.send(PipelineEvent::Translated {
            speaker_id: item.speaker_id.clone(),
            text: text.clone(),
            fallback,
        });

        if !audible.load(Ordering::SeqCst) {
            continue;
        }

        match synth.synthesize(&text, &target_language).await {
            Ok(audio) if audio.is_empty() => {
                tracing::debug!(speaker = %item.speaker_id, "No audio produced, text-only");
            }
            Ok(audio) => {
                if audio_tx.send(audio).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(
                    speaker = %item.speaker_id,
                    error = %e,
                    "Synthesis failed, item stays text-only"
                );
            }
        }
    }

    tracing::debug!("Translation worker stopped");
}

/// Single consumer of the playback queue. At most one utterance is decoded
/// or playing at any time; outputs are ducked only while it plays.
async fn playback_worker(
    mut audio_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    event_tx: mpsc::UnboundedSender<PipelineEvent>,
    player: Arc<dyn AudioPlayer>,
    outputs: Arc<dyn MediaOutputs>,
    duck_level: f32,
) {
    let mut ducker = Ducker::new(outputs, duck_level);

    while let Some(audio) = audio_rx.recv().await {
        ducker.duck();
        let _ = event_tx.send(PipelineEvent::PlaybackStarted);

        if let Err(e) = player.play(&audio).await {
            tracing::warn!(error = %e, "Playback failed, continuing with next utterance");
            let _ = event_tx.send(PipelineEvent::PlaybackFailed(e.to_string()));
        }

        // Restore runs on success and error paths alike.
        ducker.restore();
        let _ = event_tx.send(PipelineEvent::PlaybackFinished);
    }

    tracing::debug!("Playback worker stopped");
}
