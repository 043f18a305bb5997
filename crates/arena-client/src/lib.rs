//! Streaming client for the debate arena backend.
//!
//! This crate owns everything that touches the network:
//! - [`ArenaClient`] opens the primary debate stream and interprets it
//!   into `transcript` entries, with cooperative cancellation
//! - [`EventFramer`] does the line framing and JSON decoding, buffering
//!   partial lines across chunk boundaries
//! - [`InteractionController`] issues side-channel follow-up/response
//!   requests and merges their entries into the same transcript
//!
//! The pure transcript model (entries, filters, section parsing,
//! annotations, saved debates) lives in the `transcript` crate.

pub mod api;
pub mod config;
pub mod interaction;
pub mod stream;

pub use api::{debate_context, ContextTurn, FollowupRequest, RespondRequest, StartDebateRequest};
pub use config::ArenaConfig;
pub use interaction::{InteractionController, InteractionError};
pub use stream::{ArenaClient, ClientError, EventFramer, SharedState, StreamOutcome, EVENT_MARKER};
