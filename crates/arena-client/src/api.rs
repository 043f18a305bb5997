//! Request bodies sent to the arena backend.

use serde::Serialize;
use transcript::{Entry, TranscriptState};

/// One prior argument, reduced to what the backend needs for context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextTurn {
    pub agent: String,
    pub role: String,
    pub message: String,
}

/// Body for `POST /api/debate` — opens the primary event stream.
#[derive(Debug, Clone, Serialize)]
pub struct StartDebateRequest {
    pub topic: String,
    pub rounds: u32,
    pub agent_templates: Vec<String>,
}

/// Body for `POST /api/followup` — side-channel follow-up question.
#[derive(Debug, Clone, Serialize)]
pub struct FollowupRequest {
    pub topic: String,
    pub agent_template: String,
    pub question: String,
    pub context: Vec<ContextTurn>,
}

/// Body for `POST /api/respond` — side-channel agent-to-agent response.
#[derive(Debug, Clone, Serialize)]
pub struct RespondRequest {
    pub topic: String,
    pub responder_template: String,
    pub target_agent: String,
    pub target_message: String,
    pub context: Vec<ContextTurn>,
}

/// Build the side-channel context payload from the transcript: the
/// `argument` entries only, reduced to speaker, role, and message.
pub fn debate_context(transcript: &TranscriptState) -> Vec<ContextTurn> {
    transcript
        .entries()
        .iter()
        .filter_map(|entry| match entry {
            Entry::Argument {
                agent,
                role,
                message,
                ..
            } => Some(ContextTurn {
                agent: agent.clone(),
                role: role.clone().unwrap_or_default(),
                message: message.clone(),
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argument(agent: &str, role: &str, message: &str) -> Entry {
        Entry::Argument {
            round: Some(1),
            phase: None,
            agent: agent.to_string(),
            role: Some(role.to_string()),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_context_takes_arguments_only() {
        let mut t = TranscriptState::new("t");
        t.append(Entry::RoundStart { round: 1, phase: None });
        t.append(argument("Alex", "The Optimist", "Yes."));
        t.append(Entry::Followup {
            agent: Some("Alex".into()),
            role: None,
            question: Some("Why?".into()),
            message: "Because.".into(),
        });
        t.append(argument("Morgan", "The Skeptic", "No."));

        let context = debate_context(&t);
        assert_eq!(
            context,
            vec![
                ContextTurn {
                    agent: "Alex".into(),
                    role: "The Optimist".into(),
                    message: "Yes.".into(),
                },
                ContextTurn {
                    agent: "Morgan".into(),
                    role: "The Skeptic".into(),
                    message: "No.".into(),
                },
            ]
        );
    }

    #[test]
    fn test_start_request_wire_shape() {
        let request = StartDebateRequest {
            topic: "Should we?".into(),
            rounds: 3,
            agent_templates: vec!["optimist".into(), "skeptic".into()],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["topic"], "Should we?");
        assert_eq!(json["rounds"], 3);
        assert_eq!(json["agent_templates"][1], "skeptic");
    }

    #[test]
    fn test_respond_request_wire_shape() {
        let request = RespondRequest {
            topic: "t".into(),
            responder_template: "skeptic".into(),
            target_agent: "Alex".into(),
            target_message: "Yes.".into(),
            context: vec![],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["responder_template"], "skeptic");
        assert_eq!(json["target_agent"], "Alex");
        assert_eq!(json["context"], serde_json::json!([]));
    }
}
