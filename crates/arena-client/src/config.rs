//! Client configuration for the arena backend.

use std::time::Duration;

/// Where the debate backend lives and how patiently to dial it.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Base URL of the backend (no trailing path).
    pub base_url: String,
    /// Connect timeout for the initial dial. Streams themselves have no
    /// deadline; a debate takes as long as it takes.
    pub connect_timeout: Duration,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("ARENA_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5000".into()),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ArenaConfig {
    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Primary stream: start a debate.
    pub fn debate_url(&self) -> String {
        self.endpoint("/api/debate")
    }

    /// Side channel: ask one agent a follow-up question.
    pub fn followup_url(&self) -> String {
        self.endpoint("/api/followup")
    }

    /// Side channel: ask one agent to respond to a prior entry.
    pub fn respond_url(&self) -> String {
        self.endpoint("/api/respond")
    }
}
