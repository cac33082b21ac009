//! `Session` — the per-client orchestrator.
//!
//! One `Session` wires the floor protocol, the capture loop, and the
//! translation pipeline for a single participant in a single room:
//!
//! - `start_speaking` claims the floor, starts capture, and runs a
//!   supervisor task that renews the lease on a heartbeat interval and
//!   fails closed when renewal keeps failing or the lease is lost.
//! - the segment notification stream feeds non-local segments into the
//!   translation pipeline while "listen translated" is on.
//! - the broadcast channel surfaces sender-translated text as display
//!   events (the sender never synthesizes its own voice locally).
//! - while "listen translated" is on and `hear_raw_audio` is off, remote
//!   raw audio outputs are muted so only the synthesized translation is
//!   heard; flipping either toggle unmutes them.
//!
//! All outcomes reach the application layer through one
//! [`SessionEvent`] stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use plenum_core::domain::{TranscriptSegment, TranslationMessage};
use plenum_core::floor::{FloorManager, FloorView};
use plenum_core::ports::{
    BroadcastChannel, Recognizer, RecognizerError, SegmentEvent, SegmentNotifications,
    SegmentRepository, StoreError,
};
use plenum_core::{FloorStatus, Settings};

use crate::capture::{CaptureConfig, CaptureEvent, CaptureLoop};
use crate::ducking::{MediaOutputs, RawAudioGate};
use crate::error::PipelineError;
use crate::pipeline::{PipelineConfig, PipelineEvent, TranslationItem, TranslationPipeline};
use crate::playback::AudioPlayer;
use crate::synth::SynthBackend;
use crate::translate::Translator;

/// Recognizer restarts allowed per speaking turn after network failures.
const MAX_NETWORK_RESTARTS: u32 = 3;

// ── Events ─────────────────────────────────────────────────────────

/// Why a speaking turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The participant released the floor.
    Released,

    /// The lease was lost to another participant (heartbeat returned
    /// "not holder").
    FloorLost,

    /// Consecutive heartbeat failures hit the configured limit; capture
    /// stopped rather than speak on a possibly-expired lease.
    StoreUnavailable,

    /// The recognizer stopped and could not be restarted.
    RecognizerFailed,
}

/// Events emitted by the session to the application layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Interim local recognition, display-only.
    Interim {
        /// Text recognized so far.
        text: String,
    },

    /// A locally captured sentence unit was finalized and persisted.
    LocalSegment(TranscriptSegment),

    /// Sender-translated text arrived over the broadcast channel.
    RemoteTranslation(TranslationMessage),

    /// An incoming segment finished the translation step.
    Translated {
        /// Participant whose speech this is.
        speaker_id: String,
        /// Display text (translation, or the original on fallback).
        text: String,
        /// Whether translation failed and the original text was kept.
        fallback: bool,
    },

    /// Synthesized playback of one utterance started.
    PlaybackStarted,

    /// Synthesized playback of one utterance ended.
    PlaybackFinished,

    /// One utterance failed to decode or play.
    PlaybackFailed(String),

    /// The recognizer reported a failure during capture.
    RecognizerFailed(RecognizerError),

    /// The notification stream dropped `missed` segments for a slow
    /// subscriber; captions degrade to local-only for that gap.
    NotificationsLagged(u64),

    /// The speaking turn ended.
    SpeakingStopped(StopReason),
}

// ── Configuration ──────────────────────────────────────────────────

/// Identity and settings for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Room this session participates in.
    pub room_id: String,

    /// This participant's identity.
    pub participant_id: String,

    /// Language this participant speaks (recognizer language).
    pub language: String,

    /// User settings (target language, listen mode, timing constants).
    pub settings: Settings,
}

/// The external collaborators a session is wired to.
pub struct SessionPorts {
    /// Streaming speech recognizer for local capture.
    pub recognizer: Arc<dyn Recognizer>,

    /// Persistent segment storage.
    pub segments: Arc<dyn SegmentRepository>,

    /// At-least-once push stream of inserted segments.
    pub notifications: Arc<dyn SegmentNotifications>,

    /// Session data channel.
    pub broadcast: Arc<dyn BroadcastChannel>,

    /// Translation service client.
    pub translator: Arc<dyn Translator>,

    /// Selected synthesis backend.
    pub synth: Arc<dyn SynthBackend>,

    /// Playback device.
    pub player: Arc<dyn AudioPlayer>,

    /// Other participants' media outputs, for ducking.
    pub outputs: Arc<dyn MediaOutputs>,
}

// ── Session ────────────────────────────────────────────────────────

/// A running speaking turn: stop signal plus the supervisor task.
struct SpeakingTurn {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Per-client orchestrator for one room.
pub struct Session {
    room_id: String,
    participant_id: String,
    language: String,
    settings: Settings,
    floor: Arc<FloorManager>,
    recognizer: Arc<dyn Recognizer>,
    segments: Arc<dyn SegmentRepository>,
    broadcast: Arc<dyn BroadcastChannel>,
    translator: Arc<dyn Translator>,
    pipeline: Arc<TranslationPipeline>,
    listen_translated: Arc<AtomicBool>,
    hear_raw_audio: AtomicBool,
    raw_gate: StdMutex<RawAudioGate>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    speaking: Mutex<Option<SpeakingTurn>>,
    inbound_tasks: Vec<JoinHandle<()>>,
}

impl Session {
    /// Wire a session and spawn its inbound subscription tasks.
    ///
    /// Must be called from within a tokio runtime. Returns the session and
    /// its event stream.
    #[must_use]
    pub fn new(
        floor: FloorManager,
        ports: SessionPorts,
        config: SessionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let listen_translated = Arc::new(AtomicBool::new(config.settings.listen_translated));
        let raw_gate = StdMutex::new(RawAudioGate::new(Arc::clone(&ports.outputs)));

        let (pipeline, pipeline_rx) = TranslationPipeline::spawn(
            Arc::clone(&ports.translator),
            ports.synth,
            ports.player,
            ports.outputs,
            PipelineConfig::from(&config.settings),
        );
        let pipeline = Arc::new(pipeline);

        let mut inbound_tasks = Vec::with_capacity(3);
        inbound_tasks.push(tokio::spawn(forward_pipeline_events(
            pipeline_rx,
            event_tx.clone(),
        )));
        inbound_tasks.push(tokio::spawn(forward_segments(
            ports.notifications.subscribe(&config.room_id),
            Arc::clone(&pipeline),
            Arc::clone(&listen_translated),
            config.participant_id.clone(),
            event_tx.clone(),
        )));
        inbound_tasks.push(tokio::spawn(forward_broadcasts(
            ports.broadcast.subscribe(),
            config.participant_id.clone(),
            event_tx.clone(),
        )));

        let hear_raw_audio = AtomicBool::new(config.settings.hear_raw_audio);
        let session = Self {
            room_id: config.room_id,
            participant_id: config.participant_id,
            language: config.language,
            settings: config.settings,
            floor: Arc::new(floor),
            recognizer: ports.recognizer,
            segments: ports.segments,
            broadcast: ports.broadcast,
            translator: ports.translator,
            pipeline,
            listen_translated,
            hear_raw_audio,
            raw_gate,
            event_tx,
            speaking: Mutex::new(None),
            inbound_tasks,
        };
        session.apply_raw_audio_policy();
        (session, event_rx)
    }

    // ── Floor queries ──────────────────────────────────────────────

    /// Current floor status for this room.
    pub async fn floor_status(&self) -> Result<FloorStatus, PipelineError> {
        Ok(self.floor.status(&self.room_id).await?)
    }

    /// This participant's view of the floor.
    pub async fn floor_view(&self) -> Result<FloorView, PipelineError> {
        Ok(self
            .floor
            .view(&self.room_id, &self.participant_id)
            .await?)
    }

    /// Whether a speaking turn is in progress.
    pub async fn is_speaking(&self) -> bool {
        self.speaking.lock().await.is_some()
    }

    // ── Speaking lifecycle ─────────────────────────────────────────

    /// Claim the floor and start capturing.
    ///
    /// Fails with [`FloorError::FloorBusy`](plenum_core::FloorError) when
    /// someone else holds a fresh lease, and fails closed when the store is
    /// unreachable. If the recognizer cannot start, the freshly claimed
    /// floor is released before returning the error.
    pub async fn start_speaking(&self) -> Result<(), PipelineError> {
        let mut guard = self.speaking.lock().await;
        if guard.is_some() {
            return Err(PipelineError::AlreadySpeaking);
        }

        self.floor
            .claim(&self.room_id, &self.participant_id)
            .await?;

        let capture_config = CaptureConfig {
            room_id: self.room_id.clone(),
            speaker_id: self.participant_id.clone(),
            language: self.language.clone(),
            target_language: self.settings.target_language.clone(),
            max_network_restarts: MAX_NETWORK_RESTARTS,
        };

        let started = CaptureLoop::start(
            Arc::clone(&self.recognizer),
            Arc::clone(&self.segments),
            Arc::clone(&self.broadcast),
            Arc::clone(&self.translator),
            capture_config,
        )
        .await;

        let (capture, capture_rx) = match started {
            Ok(pair) => pair,
            Err(e) => {
                // Do not hold a floor nobody is speaking on.
                if let Err(release_err) = self
                    .floor
                    .release(&self.room_id, &self.participant_id)
                    .await
                {
                    tracing::warn!(error = %release_err, "Failed to release floor after capture error");
                }
                return Err(e);
            }
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(supervise_turn(TurnContext {
            floor: Arc::clone(&self.floor),
            room_id: self.room_id.clone(),
            participant_id: self.participant_id.clone(),
            heartbeat_interval: self.settings.heartbeat_interval,
            max_heartbeat_failures: self.settings.max_heartbeat_failures,
            capture,
            capture_rx,
            event_tx: self.event_tx.clone(),
            stop_rx,
        }));

        *guard = Some(SpeakingTurn { stop_tx, task });
        tracing::info!(room = %self.room_id, "Speaking turn started");
        Ok(())
    }

    /// Stop capturing and release the floor. No-op when not speaking.
    pub async fn stop_speaking(&self) {
        let turn = self.speaking.lock().await.take();
        let Some(turn) = turn else {
            return;
        };

        // The supervisor stops capture, releases the floor, and emits
        // SpeakingStopped before exiting.
        let _ = turn.stop_tx.send(());
        let _ = turn.task.await;
    }

    // ── Listening ──────────────────────────────────────────────────

    /// Toggle "listen translated" mode.
    ///
    /// Turning it off stops new segments from being enqueued and makes
    /// already-queued items text-only; items already dequeued complete and
    /// are discarded from display by the application layer. Remote raw
    /// audio is muted while this is on, unless `hear_raw_audio` is set.
    pub fn set_listen_translated(&self, on: bool) {
        self.listen_translated.store(on, Ordering::SeqCst);
        self.pipeline.set_audible(on);
        self.apply_raw_audio_policy();
    }

    /// Whether incoming segments are currently translated and played.
    #[must_use]
    pub fn is_listening_translated(&self) -> bool {
        self.listen_translated.load(Ordering::SeqCst)
    }

    /// Toggle whether remote raw audio stays audible during translated
    /// listening (by default it is muted so only the synthesis is heard).
    pub fn set_hear_raw_audio(&self, on: bool) {
        self.hear_raw_audio.store(on, Ordering::SeqCst);
        self.apply_raw_audio_policy();
    }

    /// Whether remote raw audio is kept audible while listening translated.
    #[must_use]
    pub fn hears_raw_audio(&self) -> bool {
        self.hear_raw_audio.load(Ordering::SeqCst)
    }

    fn apply_raw_audio_policy(&self) {
        let listening = self.listen_translated.load(Ordering::SeqCst);
        let hear_raw = self.hear_raw_audio.load(Ordering::SeqCst);
        if let Ok(mut gate) = self.raw_gate.lock() {
            gate.apply(listening, hear_raw);
        }
    }

    /// Recent segments for this room, newest first.
    pub async fn history(&self, limit: u32) -> Result<Vec<TranscriptSegment>, StoreError> {
        self.segments.list_for_room(&self.room_id, limit).await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for task in &self.inbound_tasks {
            task.abort();
        }
    }
}

// ── Speaking-turn supervisor ───────────────────────────────────────

/// Everything the supervisor task owns for one turn.
struct TurnContext {
    floor: Arc<FloorManager>,
    room_id: String,
    participant_id: String,
    heartbeat_interval: std::time::Duration,
    max_heartbeat_failures: u32,
    capture: CaptureLoop,
    capture_rx: mpsc::UnboundedReceiver<CaptureEvent>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    stop_rx: oneshot::Receiver<()>,
}

/// Forward capture events and renew the lease until the turn ends.
async fn supervise_turn(mut ctx: TurnContext) {
    let mut interval = tokio::time::interval(ctx.heartbeat_interval);
    // The first tick fires immediately; the lease was just written.
    interval.tick().await;

    let mut consecutive_failures: u32 = 0;
    let reason;

    loop {
        tokio::select! {
            _ = &mut ctx.stop_rx => {
                reason = StopReason::Released;
                break;
            }

            event = ctx.capture_rx.recv() => match event {
                Some(CaptureEvent::Interim { text }) => {
                    let _ = ctx.event_tx.send(SessionEvent::Interim { text });
                }
                Some(CaptureEvent::Final(segment)) => {
                    let _ = ctx.event_tx.send(SessionEvent::LocalSegment(segment));
                }
                Some(CaptureEvent::RecognizerFailed(e)) => {
                    let _ = ctx.event_tx.send(SessionEvent::RecognizerFailed(e));
                }
                Some(CaptureEvent::Stopped) | None => {
                    reason = StopReason::RecognizerFailed;
                    break;
                }
            },

            _ = interval.tick() => {
                match ctx.floor.heartbeat(&ctx.room_id, &ctx.participant_id).await {
                    Ok(true) => consecutive_failures = 0,
                    Ok(false) => {
                        tracing::warn!(room = %ctx.room_id, "Lease lost, stopping capture");
                        reason = StopReason::FloorLost;
                        break;
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        tracing::warn!(
                            error = %e,
                            consecutive_failures,
                            "Heartbeat failed"
                        );
                        if consecutive_failures >= ctx.max_heartbeat_failures {
                            // Fail closed: better to stop speaking than to
                            // keep broadcasting on an expired lease.
                            reason = StopReason::StoreUnavailable;
                            break;
                        }
                    }
                }
            }
        }
    }

    ctx.capture.stop().await;

    // When the lease is already someone else's there is nothing to release.
    if reason != StopReason::FloorLost {
        if let Err(e) = ctx.floor.release(&ctx.room_id, &ctx.participant_id).await {
            tracing::warn!(error = %e, "Failed to release floor");
        }
    }

    let _ = ctx.event_tx.send(SessionEvent::SpeakingStopped(reason));
    tracing::info!(room = %ctx.room_id, ?reason, "Speaking turn ended");
}

// ── Inbound forwarders ─────────────────────────────────────────────

/// Map pipeline events onto the session event stream.
async fn forward_pipeline_events(
    mut rx: mpsc::UnboundedReceiver<PipelineEvent>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
) {
    while let Some(event) = rx.recv().await {
        let mapped = match event {
            PipelineEvent::Translated {
                speaker_id,
                text,
                fallback,
            } => SessionEvent::Translated {
                speaker_id,
                text,
                fallback,
            },
            PipelineEvent::PlaybackStarted => SessionEvent::PlaybackStarted,
            PipelineEvent::PlaybackFinished => SessionEvent::PlaybackFinished,
            PipelineEvent::PlaybackFailed(e) => SessionEvent::PlaybackFailed(e),
        };
        if event_tx.send(mapped).is_err() {
            break;
        }
    }
}

/// Enqueue non-local segments into the pipeline while listening.
async fn forward_segments(
    mut rx: mpsc::UnboundedReceiver<SegmentEvent>,
    pipeline: Arc<TranslationPipeline>,
    listen_translated: Arc<AtomicBool>,
    participant_id: String,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            SegmentEvent::Inserted(segment) => {
                if segment.speaker_id == participant_id {
                    continue;
                }
                if listen_translated.load(Ordering::SeqCst) {
                    pipeline.enqueue(TranslationItem::new(
                        segment.speaker_id.as_str(),
                        segment.text.as_str(),
                    ));
                }
            }
            SegmentEvent::Lagged(missed) => {
                let _ = event_tx.send(SessionEvent::NotificationsLagged(missed));
            }
        }
    }
}

/// Surface sender-translated broadcasts as display events.
async fn forward_broadcasts(
    mut rx: mpsc::UnboundedReceiver<plenum_core::BroadcastPayload>,
    participant_id: String,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
) {
    while let Some(payload) = rx.recv().await {
        if payload.sender_id == participant_id {
            continue;
        }
        // Non-translation payloads simply fail to parse and are ignored.
        if let Ok(message) = TranslationMessage::from_bytes(&payload.data) {
            if event_tx
                .send(SessionEvent::RemoteTranslation(message))
                .is_err()
            {
                break;
            }
        }
    }
}
