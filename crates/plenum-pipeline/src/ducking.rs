//! Volume ducking and raw-audio muting for concurrent media outputs.
//!
//! While a synthesized utterance plays, every other media output is held at
//! or below a duck level so the translation stays intelligible. The ducker
//! captures each output's pre-duck volume exactly once per utterance and
//! restores exactly that value afterwards.
//!
//! Separately, the [`RawAudioGate`] mutes remote raw audio entirely while
//! the user listens in translation, unless they opt in to hearing both.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The session's view of other participants' media outputs.
///
/// Outputs can appear and disappear between calls (participants join and
/// leave mid-utterance); `volume` returns `None` for an output that is
/// already gone.
pub trait MediaOutputs: Send + Sync {
    /// Ids of the currently attached outputs.
    fn output_ids(&self) -> Vec<String>;

    /// Current volume of an output, 0.0 to 1.0.
    fn volume(&self, id: &str) -> Option<f32>;

    /// Set the volume of an output. Unknown ids are ignored.
    fn set_volume(&self, id: &str, volume: f32);

    /// Mute or unmute an output's raw audio. Unknown ids are ignored.
    fn set_muted(&self, id: &str, muted: bool);
}

/// Captures and restores output volumes around playback.
///
/// `duck` may be called repeatedly within one utterance (new outputs can
/// attach mid-playback): already-captured outputs keep their original
/// captured volume, so repeated ducking never compounds the attenuation.
pub struct Ducker {
    outputs: Arc<dyn MediaOutputs>,
    duck_level: f32,
    captured: HashMap<String, f32>,
}

impl Ducker {
    /// Create a ducker clamping outputs to `duck_level` during playback.
    #[must_use]
    pub fn new(outputs: Arc<dyn MediaOutputs>, duck_level: f32) -> Self {
        Self {
            outputs,
            duck_level,
            captured: HashMap::new(),
        }
    }

    /// Duck every attached output, capturing pre-duck volumes once.
    ///
    /// Outputs already quieter than the duck level are left where they are
    /// (never raised), but their volume is still captured so `restore`
    /// returns them unchanged.
    pub fn duck(&mut self) {
        for id in self.outputs.output_ids() {
            let Some(current) = self.outputs.volume(&id) else {
                continue;
            };
            let original = *self.captured.entry(id.clone()).or_insert(current);
            self.outputs.set_volume(&id, original.min(self.duck_level));
        }
    }

    /// Restore every captured output to its exact pre-duck volume.
    ///
    /// Drains the capture map, so the next `duck` starts a fresh capture.
    /// Calling with nothing captured is a no-op.
    pub fn restore(&mut self) {
        for (id, volume) in self.captured.drain() {
            self.outputs.set_volume(&id, volume);
        }
    }
}

/// Mutes remote raw audio while translated listening is on.
///
/// While "listen translated" is on and the user has not asked to keep raw
/// audio, every attached output is muted. `apply` only tracks the outputs
/// it muted itself, so flipping either flag back unmutes exactly those and
/// leaves outputs the user muted elsewhere alone.
pub struct RawAudioGate {
    outputs: Arc<dyn MediaOutputs>,
    muted: HashSet<String>,
}

impl RawAudioGate {
    /// Create a gate over the given outputs; nothing is muted yet.
    #[must_use]
    pub fn new(outputs: Arc<dyn MediaOutputs>) -> Self {
        Self {
            outputs,
            muted: HashSet::new(),
        }
    }

    /// Bring mute state in line with the listening flags.
    ///
    /// Safe to call repeatedly; outputs that attached since the last call
    /// are picked up, already-muted outputs are left untouched.
    pub fn apply(&mut self, listen_translated: bool, hear_raw_audio: bool) {
        if listen_translated && !hear_raw_audio {
            for id in self.outputs.output_ids() {
                if self.muted.insert(id.clone()) {
                    self.outputs.set_muted(&id, true);
                }
            }
        } else {
            for id in self.muted.drain() {
                self.outputs.set_muted(&id, false);
            }
        }
    }
}
