#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unsafe_code)]

pub mod domain;
pub mod error;
pub mod floor;
pub mod ports;
pub mod settings;

// Re-export key types for convenience
pub use domain::{FloorLock, FloorStatus, Language, TranscriptSegment, TranslationMessage};
pub use error::FloorError;
pub use floor::{FloorManager, FloorView, STALE_THRESHOLD};
pub use ports::{
    BroadcastChannel, BroadcastPayload, ClaimOutcome, LockStore, Recognizer, RecognizerError,
    RecognizerErrorKind, RecognizerEvent, SegmentEvent, SegmentNotifications, SegmentRepository,
    StoreError,
};
pub use settings::{Settings, SynthBackendKind};
