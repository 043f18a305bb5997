//! Debate transcript entries — the tagged event union and derived-view filters.
//!
//! Every event the arena backend emits is one immutable [`Entry`]. Consumers
//! match exhaustively on the discriminant; there is no entry hierarchy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One participant in the debate roster, as announced on the `start` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Display name (e.g. "Morgan").
    pub name: String,
    /// Role or title (e.g. "The Skeptic").
    pub role: String,
    /// Personality blurb; informational only on this side of the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    /// Declared stance ("pro", "con", "neutral").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stance: Option<String>,
}

/// Round marker — usually a number, but the synthesis entry carries the
/// label `"final"` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoundMarker {
    Number(u32),
    Label(String),
}

impl RoundMarker {
    /// Numeric round, if this marker is one.
    pub fn as_number(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Label(_) => None,
        }
    }
}

impl std::fmt::Display for RoundMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Label(label) => write!(f, "{}", label),
        }
    }
}

/// One discrete, immutable moment in a debate run.
///
/// The wire shape is `{ "kind": "...", ...kind-specific fields }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    /// Debate announced: topic, roster, planned rounds.
    Start {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
        #[serde(default)]
        agents: Vec<AgentProfile>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rounds: Option<u32>,
    },

    /// A numbered round begins (opening statements or a rebuttal round).
    RoundStart {
        round: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phase: Option<String>,
    },

    /// A debater's argument within a round.
    Argument {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phase: Option<String>,
        agent: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
        message: String,
    },

    /// An answer to a user-asked follow-up question (side channel).
    Followup {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        question: Option<String>,
        message: String,
    },

    /// One agent's requested reply to a specific prior entry (side channel).
    Response {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        responding_to: Option<String>,
        message: String,
    },

    /// Moderator synthesis of the whole debate.
    Synthesis {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<RoundMarker>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
        message: String,
    },

    /// Voting phase begins.
    VotingStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// One debater's vote for the most compelling argument.
    Vote {
        voter: String,
        vote_for: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Tallied voting results.
    VotingResults {
        #[serde(default)]
        tally: BTreeMap<String, u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Cross-examination phase begins.
    CrossExamStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// A pointed question from one debater to another.
    CrossExamQuestion {
        questioner: String,
        target: String,
        message: String,
    },

    /// The answer to a cross-examination question.
    CrossExamResponse {
        responder: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        questioner: Option<String>,
        message: String,
    },

    /// Closing-statements phase begins.
    ClosingStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// A debater's closing statement.
    Closing {
        agent: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
        message: String,
    },
}

impl Entry {
    /// The wire discriminant for this entry.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Entry::Start { .. } => "start",
            Entry::RoundStart { .. } => "round_start",
            Entry::Argument { .. } => "argument",
            Entry::Followup { .. } => "followup",
            Entry::Response { .. } => "response",
            Entry::Synthesis { .. } => "synthesis",
            Entry::VotingStart { .. } => "voting_start",
            Entry::Vote { .. } => "vote",
            Entry::VotingResults { .. } => "voting_results",
            Entry::CrossExamStart { .. } => "cross_exam_start",
            Entry::CrossExamQuestion { .. } => "cross_exam_question",
            Entry::CrossExamResponse { .. } => "cross_exam_response",
            Entry::ClosingStart { .. } => "closing_start",
            Entry::Closing { .. } => "closing",
        }
    }

    /// Whether this entry belongs to the visible transcript — the filtered
    /// subsequence that visible position indexes (and so votes and pins)
    /// are ranked over.
    pub fn is_substantive(&self) -> bool {
        matches!(
            self,
            Entry::Argument { .. }
                | Entry::Followup { .. }
                | Entry::Response { .. }
                | Entry::Synthesis { .. }
                | Entry::Vote { .. }
                | Entry::VotingResults { .. }
                | Entry::CrossExamQuestion { .. }
                | Entry::CrossExamResponse { .. }
                | Entry::Closing { .. }
        )
    }

    /// Whether this entry can be voted on or pinned: a substantive entry
    /// that has a speaker and a free-text message of its own. Vote entries
    /// and tallies are visible but not annotation targets.
    pub fn is_interactive(&self) -> bool {
        self.is_substantive() && !matches!(self, Entry::Vote { .. } | Entry::VotingResults { .. })
    }

    /// The speaker label for this entry, if it has one.
    pub fn speaker(&self) -> Option<&str> {
        match self {
            Entry::Argument { agent, .. } | Entry::Closing { agent, .. } => Some(agent),
            Entry::Followup { agent, .. }
            | Entry::Response { agent, .. }
            | Entry::Synthesis { agent, .. } => agent.as_deref(),
            Entry::Vote { voter, .. } => Some(voter),
            Entry::CrossExamQuestion { questioner, .. } => Some(questioner),
            Entry::CrossExamResponse { responder, .. } => Some(responder),
            _ => None,
        }
    }

    /// The free-text body of this entry, if it has one.
    pub fn message_text(&self) -> Option<&str> {
        match self {
            Entry::Argument { message, .. }
            | Entry::Followup { message, .. }
            | Entry::Response { message, .. }
            | Entry::Synthesis { message, .. }
            | Entry::CrossExamQuestion { message, .. }
            | Entry::CrossExamResponse { message, .. }
            | Entry::Closing { message, .. } => Some(message),
            Entry::VotingStart { message }
            | Entry::VotingResults { message, .. }
            | Entry::CrossExamStart { message }
            | Entry::ClosingStart { message } => message.as_deref(),
            Entry::Vote { reason, .. } => reason.as_deref(),
            Entry::Start { .. } | Entry::RoundStart { .. } => None,
        }
    }
}
