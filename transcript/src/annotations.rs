//! Vote and pin stores keyed by visible position index.
//!
//! Both stores key on the zero-based rank of an entry within the visible
//! (substantive) subsequence of the transcript, not on the raw entry
//! index. Pins capture a value snapshot rather than a reference; the
//! underlying entry is immutable anyway.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Direction of a user vote on one visible entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Signed value of this direction.
    pub fn value(self) -> i8 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// Tri-state votes per visible position: -1, 0 (absent), or +1.
#[derive(Debug, Clone, Default)]
pub struct VoteBoard {
    votes: HashMap<usize, i8>,
}

impl VoteBoard {
    /// Toggle a vote. Voting the stored direction again clears it to
    /// neutral; voting the opposite direction overwrites. Returns the new
    /// stored value.
    pub fn toggle(&mut self, position: usize, direction: VoteDirection) -> i8 {
        let value = direction.value();
        if self.votes.get(&position) == Some(&value) {
            self.votes.remove(&position);
            0
        } else {
            self.votes.insert(position, value);
            value
        }
    }

    /// Stored value for a position, 0 when neutral.
    pub fn value(&self, position: usize) -> i8 {
        self.votes.get(&position).copied().unwrap_or(0)
    }

    /// Number of non-neutral votes.
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn clear(&mut self) {
        self.votes.clear();
    }
}

/// Longest text snapshot a pin keeps.
pub const MAX_SNIPPET_CHARS: usize = 100;

/// Value snapshot stored by a pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedPoint {
    /// Truncated text of the pinned entry.
    pub snippet: String,
    /// Speaker label at pin time.
    pub agent: String,
}

/// Pinned points keyed by visible position, iterated in position order.
#[derive(Debug, Clone, Default)]
pub struct PinBoard {
    pins: BTreeMap<usize, PinnedPoint>,
}

impl PinBoard {
    /// Flip pin membership for a position. Pinning stores a truncated
    /// snapshot of `text` and `agent`; unpinning removes the point
    /// regardless of what `text` and `agent` are passed. Returns whether
    /// the position is pinned afterwards.
    pub fn toggle(&mut self, position: usize, text: &str, agent: &str) -> bool {
        if self.pins.remove(&position).is_some() {
            false
        } else {
            self.pins.insert(
                position,
                PinnedPoint {
                    snippet: truncate_chars(text, MAX_SNIPPET_CHARS),
                    agent: agent.to_string(),
                },
            );
            true
        }
    }

    pub fn is_pinned(&self, position: usize) -> bool {
        self.pins.contains_key(&position)
    }

    pub fn get(&self, position: usize) -> Option<&PinnedPoint> {
        self.pins.get(&position)
    }

    /// Pins in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &PinnedPoint)> {
        self.pins.iter().map(|(&pos, point)| (pos, point))
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn clear(&mut self) {
        self.pins.clear();
    }
}

/// Truncate to at most `max` characters, on a character boundary.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
