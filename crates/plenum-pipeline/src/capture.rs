//! The floor holder's capture loop.
//!
//! While a participant holds the floor, a recognizer session streams
//! `(text, is_final)` events. Interim results are surfaced locally and
//! never persisted. Finalized results are split into sentence units; each
//! unit is persisted as a [`TranscriptSegment`], translated sender-side,
//! and broadcast to the session as a [`TranslationMessage`].
//!
//! Failure policy: permission denied stops the loop; transient network
//! failures restart the recognizer a bounded number of times; a session
//! that ends on its own (end of speech) restarts for as long as capture is
//! running.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use plenum_core::domain::{TranscriptSegment, TranslationMessage};
use plenum_core::ports::{
    BroadcastChannel, Recognizer, RecognizerError, RecognizerErrorKind, RecognizerEvent,
    SegmentRepository,
};

use crate::error::PipelineError;
use crate::text::split_sentence_units;
use crate::translate::Translator;

// ── Events ─────────────────────────────────────────────────────────

/// Events surfaced by the capture loop to the session.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// An interim recognition result. Display-only, never persisted.
    Interim {
        /// Text recognized so far.
        text: String,
    },

    /// One sentence unit was finalized and persisted.
    Final(TranscriptSegment),

    /// The recognizer failed. A network failure may be followed by an
    /// automatic restart; permission denial is final.
    RecognizerFailed(RecognizerError),

    /// The loop exited and no further events will arrive.
    Stopped,
}

/// Capture parameters for one speaking turn.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Room the speaker holds the floor in.
    pub room_id: String,

    /// The speaking participant.
    pub speaker_id: String,

    /// Language being spoken (recognizer language).
    pub language: String,

    /// Language the sender-side translation is broadcast in.
    pub target_language: String,

    /// Automatic restarts allowed after transient network failures.
    pub max_network_restarts: u32,
}

// ── Capture loop ───────────────────────────────────────────────────

/// A running capture loop for one speaking turn.
pub struct CaptureLoop {
    recognizer: Arc<dyn Recognizer>,
    running: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl CaptureLoop {
    /// Start a recognizer session and spawn the event loop.
    ///
    /// Fails only if the initial recognizer start fails (e.g. permission
    /// denied before any audio is captured).
    pub async fn start(
        recognizer: Arc<dyn Recognizer>,
        segments: Arc<dyn SegmentRepository>,
        broadcast: Arc<dyn BroadcastChannel>,
        translator: Arc<dyn Translator>,
        config: CaptureConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<CaptureEvent>), PipelineError> {
        let session_rx = recognizer.start(&config.language).await?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(run_loop(
            Arc::clone(&recognizer),
            segments,
            broadcast,
            translator,
            config,
            session_rx,
            event_tx,
            Arc::clone(&running),
        ));

        Ok((
            Self {
                recognizer,
                running,
                task,
            },
            event_rx,
        ))
    }

    /// Whether the loop is still consuming recognizer events.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop capture: ends the recognizer session and lets the loop drain.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.recognizer.stop().await;
    }

    /// Wait for the loop task to finish. Used by tests and orderly shutdown.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

// ── Loop body ──────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
async fn run_loop(
    recognizer: Arc<dyn Recognizer>,
    segments: Arc<dyn SegmentRepository>,
    broadcast: Arc<dyn BroadcastChannel>,
    translator: Arc<dyn Translator>,
    config: CaptureConfig,
    mut session_rx: mpsc::UnboundedReceiver<RecognizerEvent>,
    event_tx: mpsc::UnboundedSender<CaptureEvent>,
    running: Arc<AtomicBool>,
) {
    let mut restarts_left = config.max_network_restarts;

    'sessions: loop {
        while let Some(event) = session_rx.recv().await {
            match event {
                RecognizerEvent::Result { text, is_final: false } => {
                    let _ = event_tx.send(CaptureEvent::Interim { text });
                }
                RecognizerEvent::Result { text, is_final: true } => {
                    handle_final(&*segments, &*broadcast, &*translator, &config, &text, &event_tx)
                        .await;
                }
                RecognizerEvent::Error(e) => {
                    tracing::warn!(kind = ?e.kind, error = %e.message, "Recognizer session failed");
                    let _ = event_tx.send(CaptureEvent::RecognizerFailed(e.clone()));

                    let retryable = e.kind == RecognizerErrorKind::Network
                        && restarts_left > 0
                        && running.load(Ordering::SeqCst);
                    if !retryable {
                        break 'sessions;
                    }
                    restarts_left -= 1;
                    match recognizer.start(&config.language).await {
                        Ok(rx) => {
                            tracing::info!(restarts_left, "Recognizer restarted");
                            session_rx = rx;
                            continue 'sessions;
                        }
                        Err(e) => {
                            let _ = event_tx.send(CaptureEvent::RecognizerFailed(e));
                            break 'sessions;
                        }
                    }
                }
                RecognizerEvent::Ended => {
                    // End of speech is not an error; keep listening while
                    // the floor is held.
                    if !running.load(Ordering::SeqCst) {
                        break 'sessions;
                    }
                    match recognizer.start(&config.language).await {
                        Ok(rx) => {
                            session_rx = rx;
                            continue 'sessions;
                        }
                        Err(e) => {
                            let _ = event_tx.send(CaptureEvent::RecognizerFailed(e));
                            break 'sessions;
                        }
                    }
                }
            }
        }

        // Stream closed without a terminal event: treat like Ended.
        if !running.load(Ordering::SeqCst) {
            break;
        }
        match recognizer.start(&config.language).await {
            Ok(rx) => session_rx = rx,
            Err(e) => {
                let _ = event_tx.send(CaptureEvent::RecognizerFailed(e));
                break;
            }
        }
    }

    running.store(false, Ordering::SeqCst);
    let _ = event_tx.send(CaptureEvent::Stopped);
    tracing::debug!(room = %config.room_id, "Capture loop stopped");
}

/// Persist, translate, and broadcast one finalized utterance.
async fn handle_final(
    segments: &dyn SegmentRepository,
    broadcast: &dyn BroadcastChannel,
    translator: &dyn Translator,
    config: &CaptureConfig,
    text: &str,
    event_tx: &mpsc::UnboundedSender<CaptureEvent>,
) {
    for unit in split_sentence_units(text) {
        let segment = TranscriptSegment::finalized(
            config.room_id.as_str(),
            config.speaker_id.as_str(),
            unit.as_str(),
            config.language.as_str(),
        );

        // A store outage degrades the history, not the live path.
        if let Err(e) = segments.insert(&segment).await {
            tracing::warn!(error = %e, "Failed to persist segment, broadcasting anyway");
        }
        let _ = event_tx.send(CaptureEvent::Final(segment));

        let translated = match translator.translate(&unit, &config.target_language).await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "Sender-side translation failed, keeping original");
                unit.clone()
            }
        };

        let message = TranslationMessage {
            text: translated,
            target_language: config.target_language.clone(),
            timestamp: Utc::now().timestamp_millis(),
            source_participant_id: config.speaker_id.clone(),
        };
        match message.to_bytes() {
            Ok(bytes) => {
                if let Err(e) = broadcast.publish(&config.speaker_id, bytes) {
                    tracing::warn!(error = %e, "Broadcast publish failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode translation message"),
        }
    }
}
