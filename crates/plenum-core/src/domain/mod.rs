//! Domain types for floor-controlled translated sessions.
//!
//! These are plain data types shared by every adapter. Wire-facing types
//! serialize as camelCase JSON; persisted types carry their own identity.

pub mod language;
pub mod lock;
pub mod message;
pub mod segment;

pub use language::{Language, LANGUAGES, primary_subtag};
pub use lock::{FloorLock, FloorStatus};
pub use message::TranslationMessage;
pub use segment::TranscriptSegment;
