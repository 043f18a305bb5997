//! Side-channel request controller.
//!
//! Two symmetric user interactions — asking one agent a follow-up question
//! and asking one agent to respond to a prior entry — each open a fresh
//! event stream and merge its entries into the same transcript, appended
//! at the end. One interaction may be in flight at a time; the flag is
//! unrelated to (and never blocks) the primary debate stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::api::{debate_context, ContextTurn, FollowupRequest, RespondRequest};
use crate::stream::{ArenaClient, ClientError, SharedState};

/// Failures of a side-channel interaction.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("another interaction is already in flight")]
    AlreadyInFlight,

    #[error("no interactive entry at visible position {position}")]
    TargetNotFound { position: usize },

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Issues follow-up and respond requests, one at a time.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag on every exit path.
#[derive(Debug)]
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an interaction is currently in flight (UI disables
    /// re-submission while true).
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<InFlightGuard, InteractionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(InteractionError::AlreadyInFlight);
        }
        Ok(InFlightGuard {
            flag: Arc::clone(&self.in_flight),
        })
    }

    /// Ask `agent_template` a follow-up question. Resulting `followup`
    /// entries are appended to the transcript; returns how many arrived.
    pub async fn ask_followup(
        &self,
        client: &ArenaClient,
        state: &SharedState,
        agent_template: &str,
        question: &str,
    ) -> Result<usize, InteractionError> {
        let _guard = self.begin()?;
        let (topic, context, epoch) = snapshot(state).await;

        let request = FollowupRequest {
            topic,
            agent_template: agent_template.to_string(),
            question: question.to_string(),
            context,
        };
        info!(agent = agent_template, "asking follow-up question");
        let appended = client
            .run_side_channel(client.config().followup_url(), &request, state, epoch, "followup")
            .await?;
        Ok(appended)
    }

    /// Ask `responder_template` to respond to the entry at the given
    /// visible position. Resulting `response` entries are appended to the
    /// transcript; returns how many arrived.
    pub async fn request_response(
        &self,
        client: &ArenaClient,
        state: &SharedState,
        responder_template: &str,
        target_position: usize,
    ) -> Result<usize, InteractionError> {
        let _guard = self.begin()?;

        let (request, epoch) = {
            let st = state.lock().await;
            let target = st
                .transcript
                .visible_entry(target_position)
                .filter(|entry| entry.is_interactive())
                .ok_or(InteractionError::TargetNotFound {
                    position: target_position,
                })?;
            let (target_agent, target_message) = match (target.speaker(), target.message_text()) {
                (Some(agent), Some(message)) => (agent.to_string(), message.to_string()),
                _ => {
                    return Err(InteractionError::TargetNotFound {
                        position: target_position,
                    })
                }
            };
            (
                RespondRequest {
                    topic: st.transcript.topic.clone(),
                    responder_template: responder_template.to_string(),
                    target_agent,
                    target_message,
                    context: debate_context(&st.transcript),
                },
                st.run_id(),
            )
        };
        info!(
            responder = responder_template,
            target = %request.target_agent,
            "requesting agent response"
        );
        let appended = client
            .run_side_channel(client.config().respond_url(), &request, state, epoch, "response")
            .await?;
        Ok(appended)
    }
}

async fn snapshot(state: &SharedState) -> (String, Vec<ContextTurn>, u64) {
    let st = state.lock().await;
    (
        st.transcript.topic.clone(),
        debate_context(&st.transcript),
        st.run_id(),
    )
}
