//! Transcript and debate-session state.
//!
//! The transcript is append-only for the lifetime of one debate run: no
//! entry is ever mutated or removed once appended. Alongside the raw entry
//! list the state keeps the one canonical filtered ordering (the visible
//! transcript) that votes and pins key their position indexes on.

use crate::annotations::{PinBoard, VoteBoard};
use crate::entry::{AgentProfile, Entry};
use crate::saved::SavedDebate;

/// Lifecycle of one debate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// No run started yet.
    Idle,
    /// Entries are still arriving.
    Streaming,
    /// The stream ended normally.
    Complete,
    /// The user cancelled the run; the partial transcript stays valid.
    Cancelled,
    /// The transport failed; the partial transcript stays valid.
    Failed,
}

impl RunStatus {
    /// Whether the run can accept no further primary-stream entries.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled | Self::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Streaming => write!(f, "streaming"),
            Self::Complete => write!(f, "complete"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Append-only transcript of one debate run plus its derived views.
#[derive(Debug, Clone)]
pub struct TranscriptState {
    /// Debate topic (updated from the `start` entry when it carries one).
    pub topic: String,
    /// Roster announced by the `start` entry.
    pub agents: Vec<AgentProfile>,
    /// Last round announced by a `round_start` entry, 0 before any.
    pub current_round: u32,
    /// Run lifecycle.
    pub status: RunStatus,
    entries: Vec<Entry>,
    visible: Vec<usize>,
}

impl TranscriptState {
    /// Create an empty transcript for a new run.
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            agents: Vec::new(),
            current_round: 0,
            status: RunStatus::Idle,
            entries: Vec::new(),
            visible: Vec::new(),
        }
    }

    /// Append one decoded entry in arrival order.
    ///
    /// `start` entries update the topic and roster; `round_start` entries
    /// update the current-round scalar. Substantive entries extend the
    /// canonical visible ordering.
    pub fn append(&mut self, entry: Entry) {
        match &entry {
            Entry::Start { topic, agents, .. } => {
                if let Some(topic) = topic {
                    self.topic = topic.clone();
                }
                if !agents.is_empty() {
                    self.agents = agents.clone();
                }
            }
            Entry::RoundStart { round, .. } => self.current_round = *round,
            _ => {}
        }
        if entry.is_substantive() {
            self.visible.push(self.entries.len());
        }
        self.entries.push(entry);
    }

    /// All entries in arrival order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length of the visible (substantive) subsequence.
    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Entry at a visible position index.
    pub fn visible_entry(&self, position: usize) -> Option<&Entry> {
        self.visible.get(position).map(|&i| &self.entries[i])
    }

    /// Visible entries paired with their position indexes.
    pub fn visible_entries(&self) -> impl Iterator<Item = (usize, &Entry)> {
        self.visible
            .iter()
            .enumerate()
            .map(|(pos, &i)| (pos, &self.entries[i]))
    }

    pub fn mark_streaming(&mut self) {
        self.status = RunStatus::Streaming;
    }

    pub fn mark_complete(&mut self) {
        self.status = RunStatus::Complete;
    }

    pub fn mark_cancelled(&mut self) {
        self.status = RunStatus::Cancelled;
    }

    pub fn mark_failed(&mut self) {
        self.status = RunStatus::Failed;
    }
}

/// Session-scoped mutable state: the transcript plus both annotation
/// stores, owned as one struct and passed by reference to the stream
/// interpreter and the annotation callers.
#[derive(Debug, Clone)]
pub struct DebateState {
    run_id: u64,
    pub transcript: TranscriptState,
    pub votes: VoteBoard,
    pub pins: PinBoard,
}

impl Default for DebateState {
    fn default() -> Self {
        Self::new()
    }
}

impl DebateState {
    pub fn new() -> Self {
        Self {
            run_id: 0,
            transcript: TranscriptState::new(""),
            votes: VoteBoard::default(),
            pins: PinBoard::default(),
        }
    }

    /// Epoch counter, bumped whenever the transcript is replaced. A
    /// side-channel request captures this at submission time and drops any
    /// entry that decodes after the epoch has moved on.
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Start a fresh transcript for a new debate. Votes and pins reset.
    pub fn reset(&mut self, topic: &str) {
        self.run_id += 1;
        self.transcript = TranscriptState::new(topic);
        self.votes.clear();
        self.pins.clear();
    }

    /// Replace the transcript with a saved snapshot. Votes and pins reset.
    pub fn load_saved(&mut self, saved: &SavedDebate) {
        self.run_id += 1;
        let mut transcript = TranscriptState::new(&saved.topic);
        transcript.agents = saved.agents.clone();
        for entry in &saved.entries {
            transcript.append(entry.clone());
        }
        transcript.mark_complete();
        self.transcript = transcript;
        self.votes.clear();
        self.pins.clear();
    }
}
