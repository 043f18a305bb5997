//! Stream interpreter: SSE framing, entry decoding, and the debate run loop.
//!
//! The backend answers each request with a line-framed event stream. Chunk
//! boundaries are arbitrary — an event terminator can land exactly on one —
//! so [`EventFramer`] buffers raw bytes and only decodes once a full line
//! has been observed. Decode failures are logged and skipped; they never
//! abort the stream.

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use transcript::{DebateState, Entry};

use crate::api::StartDebateRequest;
use crate::config::ArenaConfig;

/// Marker prefix of a meaningful stream line. Lines without it are ignored.
pub const EVENT_MARKER: &str = "data:";

/// Debate state shared between the primary stream, the side channel, and
/// the caller. All mutation happens synchronously under the lock, one
/// decoded event at a time.
pub type SharedState = Arc<tokio::sync::Mutex<DebateState>>;

/// How a stream run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// End-of-stream reached; the run is complete.
    Complete,
    /// Cancellation was requested; the partial transcript stays valid.
    Cancelled,
}

/// Terminal client-side failures. Cancellation is not one of them.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}")]
    Status { status: reqwest::StatusCode },
}

/// Frames an incrementally-delivered byte stream into decoded entries.
///
/// Incomplete trailing lines are carried across [`push`](Self::push)
/// calls; [`finish`](Self::finish) flushes a final line that arrived
/// without its terminator.
#[derive(Debug, Default)]
pub struct EventFramer {
    buf: Vec<u8>,
}

impl EventFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every entry whose line completed with it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Entry> {
        self.buf.extend_from_slice(chunk);
        let mut entries = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(entry) = decode_line(&line[..line.len() - 1]) {
                entries.push(entry);
            }
        }
        entries
    }

    /// Flush a trailing line that never saw its terminator (end-of-stream).
    pub fn finish(&mut self) -> Vec<Entry> {
        if self.buf.is_empty() {
            return Vec::new();
        }
        let line = std::mem::take(&mut self.buf);
        decode_line(&line).into_iter().collect()
    }
}

/// Decode one complete line into an entry, or `None` for lines without
/// the event marker and for payloads that fail to decode.
fn decode_line(line: &[u8]) -> Option<Entry> {
    let text = String::from_utf8_lossy(line);
    let payload = text.trim_end_matches('\r').strip_prefix(EVENT_MARKER)?.trim();
    if payload.is_empty() {
        return None;
    }
    match serde_json::from_str::<Entry>(payload) {
        Ok(entry) => Some(entry),
        Err(err) => {
            // A backend event outside the entry vocabulary (e.g. its
            // end-of-debate marker) is expected noise; garbage is not.
            match serde_json::from_str::<serde_json::Value>(payload) {
                Ok(value) => debug!(
                    kind = value.get("kind").and_then(|k| k.as_str()).unwrap_or("?"),
                    "skipping event outside the entry vocabulary"
                ),
                Err(_) => warn!(error = %err, "skipping undecodable event line"),
            }
            None
        }
    }
}

/// HTTP client for the arena backend.
pub struct ArenaClient {
    http: reqwest::Client,
    config: ArenaConfig,
}

impl ArenaClient {
    pub fn new(config: ArenaConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Start a debate and interpret its primary event stream until
    /// end-of-stream, cancellation, or transport failure.
    ///
    /// Every decoded entry is appended to `state` in arrival order. The
    /// transcript status is updated on every exit path, and the response
    /// body (with its connection) is dropped on every exit path.
    pub async fn run_debate(
        &self,
        request: &StartDebateRequest,
        state: &SharedState,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, ClientError> {
        let epoch = state.lock().await.run_id();

        let response = match self.http.post(self.config.debate_url()).json(request).send().await {
            Ok(response) => response,
            Err(err) => {
                state.lock().await.transcript.mark_failed();
                return Err(err.into());
            }
        };
        let status = response.status();
        if !status.is_success() {
            state.lock().await.transcript.mark_failed();
            return Err(ClientError::Status { status });
        }
        state.lock().await.transcript.mark_streaming();

        let mut stream = response.bytes_stream();
        let mut framer = EventFramer::new();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let mut st = state.lock().await;
                    if st.run_id() == epoch {
                        st.transcript.mark_cancelled();
                    }
                    return Ok(StreamOutcome::Cancelled);
                }
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        if !append_batch(state, epoch, framer.push(&bytes)).await {
                            // The transcript was replaced under us; the old
                            // run is over.
                            return Ok(StreamOutcome::Cancelled);
                        }
                    }
                    Some(Err(err)) => {
                        let mut st = state.lock().await;
                        if st.run_id() == epoch {
                            st.transcript.mark_failed();
                        }
                        return Err(err.into());
                    }
                    None => {
                        append_batch(state, epoch, framer.finish()).await;
                        let mut st = state.lock().await;
                        if st.run_id() == epoch {
                            st.transcript.mark_complete();
                        }
                        return Ok(StreamOutcome::Complete);
                    }
                }
            }
        }
    }

    /// Open a side-channel stream and merge entries of the one expected
    /// kind into the same transcript. Returns how many were appended.
    ///
    /// Entries decoded after the debate epoch moved on (a new debate
    /// started or a saved one was loaded) are discarded.
    pub(crate) async fn run_side_channel<B: Serialize>(
        &self,
        url: String,
        body: &B,
        state: &SharedState,
        epoch: u64,
        expected_kind: &'static str,
    ) -> Result<usize, ClientError> {
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { status });
        }

        let mut stream = response.bytes_stream();
        let mut framer = EventFramer::new();
        let mut appended = 0;
        let mut done = false;
        while !done {
            let batch = match stream.next().await {
                Some(Ok(bytes)) => framer.push(&bytes),
                Some(Err(err)) => return Err(err.into()),
                None => {
                    done = true;
                    framer.finish()
                }
            };
            let accepted: Vec<Entry> = batch
                .into_iter()
                .filter(|entry| {
                    let keep = entry.kind_label() == expected_kind;
                    if !keep {
                        debug!(
                            kind = entry.kind_label(),
                            expected = expected_kind,
                            "side channel ignoring foreign kind"
                        );
                    }
                    keep
                })
                .collect();
            if accepted.is_empty() {
                continue;
            }
            let count = accepted.len();
            if !append_batch(state, epoch, accepted).await {
                return Ok(appended);
            }
            appended += count;
        }
        Ok(appended)
    }
}

/// Append a decoded batch under the lock; returns false (appending
/// nothing) when the debate epoch no longer matches.
async fn append_batch(state: &SharedState, epoch: u64, entries: Vec<Entry>) -> bool {
    if entries.is_empty() {
        return true;
    }
    let mut st = state.lock().await;
    if st.run_id() != epoch {
        debug!(dropped = entries.len(), "transcript was replaced; dropping late entries");
        return false;
    }
    for entry in entries {
        st.transcript.append(entry);
    }
    true
}
