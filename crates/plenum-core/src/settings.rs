//! User-facing session settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which speech-synthesis backend the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SynthBackendKind {
    /// On-device synthesizer (blocking local capability).
    #[default]
    Local,

    /// Hosted synthesis service returning raw audio bytes.
    Remote,
}

/// Session settings with stable serde defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Language incoming speech is translated into.
    pub target_language: String,

    /// Whether incoming segments are translated and played back.
    pub listen_translated: bool,

    /// When listening translated, whether remote raw audio stays audible.
    pub hear_raw_audio: bool,

    /// Selected synthesis backend.
    pub synth_backend: SynthBackendKind,

    /// Lease age at which a floor lock is treated as abandoned.
    #[serde(with = "duration_secs")]
    pub stale_threshold: Duration,

    /// Interval between lease renewals while holding the floor.
    #[serde(with = "duration_secs")]
    pub heartbeat_interval: Duration,

    /// Volume ceiling applied to other media while synthesized speech plays.
    pub duck_level: f32,

    /// Consecutive heartbeat failures after which capture stops (fail closed).
    pub max_heartbeat_failures: u32,
}

impl Settings {
    /// Defaults matching the protocol constants.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            target_language: "en-US".to_string(),
            listen_translated: false,
            hear_raw_audio: false,
            synth_backend: SynthBackendKind::Local,
            stale_threshold: Duration::from_secs(120),
            heartbeat_interval: Duration::from_secs(30),
            duck_level: 0.25,
            max_heartbeat_failures: 3,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

mod duration_secs {
    //! Serialize durations as whole seconds.

    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_constants() {
        let s = Settings::with_defaults();
        assert_eq!(s.stale_threshold, Duration::from_secs(120));
        assert!((s.duck_level - 0.25).abs() < f32::EPSILON);
        assert!(!s.listen_translated);
    }

    #[test]
    fn settings_round_trip_json() {
        let s = Settings {
            target_language: "fr-FR".to_string(),
            listen_translated: true,
            ..Settings::with_defaults()
        };
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let s: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(s, Settings::with_defaults());
    }
}
