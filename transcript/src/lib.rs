//! Debate transcript core
//!
//! Pure (network-free) model for the arena viewer:
//! - the tagged [`Entry`] event union and its visible/interactive filters
//! - append-only [`TranscriptState`] with the canonical visible ordering
//! - the [`SectionParser`] recovering structure from synthesis text
//! - vote/pin annotation stores keyed by visible position index
//! - the bounded saved-debate library
//!
//! The streaming side (framing, decoding, cancellation, side-channel
//! requests) lives in the `arena-client` crate and feeds entries into
//! this one.

pub mod annotations;
pub mod entry;
pub mod saved;
pub mod sections;
pub mod state;

pub use annotations::{PinBoard, PinnedPoint, VoteBoard, VoteDirection, MAX_SNIPPET_CHARS};
pub use entry::{AgentProfile, Entry, RoundMarker};
pub use saved::{SavedDebate, SavedDebates, SavedError, MAX_SAVED};
pub use sections::{Section, SectionParser, DEFAULT_TITLES};
pub use state::{DebateState, RunStatus, TranscriptState};
