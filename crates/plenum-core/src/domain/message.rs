//! Wire message for sender-side translated speech.

use serde::{Deserialize, Serialize};

/// Transient message broadcast to every other session member after the
/// floor holder translates one of its own segments.
///
/// Not persisted. The transport is at-least-once, so receivers must
/// tolerate duplicates — playback is idempotent and duplicate playback is
/// only a UX nuisance, so no dedup key is carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationMessage {
    /// Translated (or, after fallback, original) text.
    pub text: String,

    /// Language the text was translated into.
    pub target_language: String,

    /// Sender wall-clock timestamp, milliseconds since the Unix epoch.
    pub timestamp: i64,

    /// Identity of the participant whose speech this is.
    pub source_participant_id: String,
}

impl TranslationMessage {
    /// Serialize for the broadcast channel.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parse a broadcast payload. Non-translation payloads simply fail to
    /// parse and are ignored by receivers.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_camel_case() {
        let msg = TranslationMessage {
            text: "Hola".to_string(),
            target_language: "es".to_string(),
            timestamp: 1_700_000_000_000,
            source_participant_id: "alice".to_string(),
        };
        let json = String::from_utf8(msg.to_bytes().unwrap()).unwrap();
        assert!(json.contains("targetLanguage"));
        assert!(json.contains("sourceParticipantId"));

        let parsed = TranslationMessage::from_bytes(json.as_bytes()).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn garbage_payload_fails_to_parse() {
        assert!(TranslationMessage::from_bytes(b"not json").is_err());
        assert!(TranslationMessage::from_bytes(b"{\"other\":1}").is_err());
    }
}
