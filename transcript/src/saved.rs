//! Bounded saved-debate library.
//!
//! Completed (or partial) transcripts can be snapshotted into a
//! most-recent-first list capped at [`MAX_SAVED`] records. The library
//! round-trips through JSON; where the bytes live is the caller's concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::entry::{AgentProfile, Entry};
use crate::state::TranscriptState;

/// Most saved debates retained after any save.
pub const MAX_SAVED: usize = 10;

/// A full transcript snapshot with the roster it ran with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedDebate {
    pub id: String,
    pub topic: String,
    pub timestamp: DateTime<Utc>,
    pub entries: Vec<Entry>,
    pub agents: Vec<AgentProfile>,
}

impl SavedDebate {
    /// Snapshot a transcript under a fresh id.
    pub fn from_transcript(transcript: &TranscriptState) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            topic: transcript.topic.clone(),
            timestamp: Utc::now(),
            entries: transcript.entries().to_vec(),
            agents: transcript.agents.clone(),
        }
    }
}

/// Error for saved-library JSON round-trips.
#[derive(Debug, Error)]
pub enum SavedError {
    #[error("failed to serialize saved debates: {reason}")]
    SerializeFailed { reason: String },

    #[error("failed to deserialize saved debates: {reason}")]
    DeserializeFailed { reason: String },
}

/// Ordered saved-debate list, most recent first, capped at [`MAX_SAVED`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedDebates {
    debates: Vec<SavedDebate>,
}

impl SavedDebates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a snapshot at the front and truncate to the cap. Returns
    /// the id of the saved record.
    pub fn save(&mut self, debate: SavedDebate) -> String {
        let id = debate.id.clone();
        self.debates.insert(0, debate);
        self.debates.truncate(MAX_SAVED);
        id
    }

    /// Remove the record with the given id. Returns whether one existed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.debates.len();
        self.debates.retain(|d| d.id != id);
        self.debates.len() != before
    }

    /// Empty the whole list.
    pub fn clear(&mut self) {
        self.debates.clear();
    }

    pub fn get(&self, id: &str) -> Option<&SavedDebate> {
        self.debates.iter().find(|d| d.id == id)
    }

    /// Records, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &SavedDebate> {
        self.debates.iter()
    }

    pub fn len(&self) -> usize {
        self.debates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.debates.is_empty()
    }

    pub fn to_json(&self) -> Result<String, SavedError> {
        serde_json::to_string_pretty(self).map_err(|e| SavedError::SerializeFailed {
            reason: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SavedError> {
        serde_json::from_str(json).map_err(|e| SavedError::DeserializeFailed {
            reason: e.to_string(),
        })
    }
}
