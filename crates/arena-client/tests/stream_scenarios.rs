//! End-to-end stream interpreter scenarios against a local one-shot
//! event-stream server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use arena_client::{
    ArenaClient, ArenaConfig, ClientError, InteractionController, InteractionError, SharedState,
    StartDebateRequest, StreamOutcome,
};
use transcript::{DebateState, RunStatus};

fn event(json: &str) -> String {
    format!("data: {json}\n")
}

fn argument_event(agent: &str, message: &str) -> String {
    event(&format!(
        r#"{{"kind":"argument","round":1,"agent":"{agent}","role":"Debater","message":"{message}"}}"#
    ))
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Consume the request (headers plus content-length body) so the socket
/// can be closed cleanly after the response.
async fn read_request(sock: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    loop {
        let n = sock.read(&mut tmp).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
            let body_len: usize = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
            let mut have = buf.len() - (pos + 4);
            while have < body_len {
                let n = sock.read(&mut tmp).await.unwrap();
                if n == 0 {
                    return;
                }
                have += n;
            }
            return;
        }
    }
}

/// Serve exactly one request: a 200 event-stream carrying `chunks`, each
/// written after `pre_delay`, then close (end-of-stream). `stall_after`
/// keeps the socket open without data after the chunks instead of
/// closing it.
async fn serve_stream(chunks: Vec<String>, pre_delay: Duration, stall_after: bool) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        read_request(&mut sock).await;
        sock.write_all(
            b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n",
        )
        .await
        .unwrap();
        if !pre_delay.is_zero() {
            tokio::time::sleep(pre_delay).await;
        }
        for chunk in chunks {
            sock.write_all(chunk.as_bytes()).await.unwrap();
            sock.flush().await.unwrap();
        }
        if stall_after {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
    });
    addr
}

async fn serve_error(status_line: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        read_request(&mut sock).await;
        let response = format!("HTTP/1.1 {status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        sock.write_all(response.as_bytes()).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> ArenaClient {
    ArenaClient::new(ArenaConfig {
        base_url: format!("http://{addr}"),
        connect_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn fresh_state(topic: &str) -> SharedState {
    let mut state = DebateState::new();
    state.reset(topic);
    Arc::new(tokio::sync::Mutex::new(state))
}

fn start_request() -> StartDebateRequest {
    StartDebateRequest {
        topic: "Should developers use AI assistants?".into(),
        rounds: 2,
        agent_templates: vec!["optimist".into(), "skeptic".into()],
    }
}

#[tokio::test]
async fn five_arguments_and_a_synthesis_complete_the_run() {
    let mut chunks: Vec<String> = (0..5)
        .map(|i| argument_event("Alex", &format!("point {i}")))
        .collect();
    chunks.push(event(
        r#"{"kind":"synthesis","round":"final","agent":"Moderator","role":"Synthesis","message":"**Confidence** High"}"#,
    ));
    let addr = serve_stream(chunks, Duration::ZERO, false).await;

    let state = fresh_state("t");
    let outcome = client_for(addr)
        .run_debate(&start_request(), &state, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome, StreamOutcome::Complete);

    let st = state.lock().await;
    assert_eq!(st.transcript.len(), 6);
    // No round_start ever arrived.
    assert_eq!(st.transcript.current_round, 0);
    assert_eq!(st.transcript.status, RunStatus::Complete);
}

#[tokio::test]
async fn round_start_updates_current_round() {
    let chunks = vec![
        event(r#"{"kind":"start","topic":"T","agents":[{"name":"Alex","role":"The Optimist"}],"rounds":2}"#),
        event(r#"{"kind":"round_start","round":1,"phase":"Opening Statements"}"#),
        argument_event("Alex", "opening"),
        event(r#"{"kind":"round_start","round":2,"phase":"Rebuttal Round 1"}"#),
        argument_event("Alex", "rebuttal"),
        // The backend's end marker is outside the entry vocabulary and
        // must be skipped without aborting the stream.
        event(r#"{"kind":"end","total_arguments":2}"#),
    ];
    let addr = serve_stream(chunks, Duration::ZERO, false).await;

    let state = fresh_state("t");
    let outcome = client_for(addr)
        .run_debate(&start_request(), &state, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome, StreamOutcome::Complete);

    let st = state.lock().await;
    assert_eq!(st.transcript.len(), 4);
    assert_eq!(st.transcript.current_round, 2);
    assert_eq!(st.transcript.topic, "T");
    assert_eq!(st.transcript.agents.len(), 1);
    assert_eq!(st.transcript.visible_len(), 2);
}

#[tokio::test]
async fn cancellation_freezes_a_valid_partial_transcript() {
    // Two events, then the socket stalls.
    let chunks = vec![
        argument_event("Alex", "one"),
        argument_event("Morgan", "two"),
    ];
    let addr = serve_stream(chunks, Duration::ZERO, true).await;

    let state = fresh_state("t");
    let cancel = CancellationToken::new();
    let client = Arc::new(client_for(addr));
    let run = tokio::spawn({
        let client = Arc::clone(&client);
        let state = Arc::clone(&state);
        let cancel = cancel.clone();
        async move { client.run_debate(&start_request(), &state, &cancel).await }
    });

    // Wait until both events landed, then cancel.
    for _ in 0..100 {
        if state.lock().await.transcript.len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cancel.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, StreamOutcome::Cancelled);

    let st = state.lock().await;
    assert_eq!(st.transcript.len(), 2);
    assert_eq!(st.transcript.status, RunStatus::Cancelled);
    assert_ne!(st.transcript.status, RunStatus::Failed);
}

#[tokio::test]
async fn non_success_status_is_a_terminal_failure() {
    let addr = serve_error("500 Internal Server Error").await;
    let state = fresh_state("t");

    let err = client_for(addr)
        .run_debate(&start_request(), &state, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status } if status.as_u16() == 500));
    assert_eq!(state.lock().await.transcript.status, RunStatus::Failed);
}

#[tokio::test]
async fn event_split_across_tcp_writes_decodes_once() {
    let line = argument_event("Alex", "split across the wire");
    let (first, second) = line.split_at(line.len() / 2);
    let addr = serve_stream(
        vec![first.to_string(), second.to_string()],
        Duration::ZERO,
        false,
    )
    .await;

    let state = fresh_state("t");
    client_for(addr)
        .run_debate(&start_request(), &state, &CancellationToken::new())
        .await
        .unwrap();
    let st = state.lock().await;
    assert_eq!(st.transcript.len(), 1);
    assert_eq!(
        st.transcript.entries()[0].message_text(),
        Some("split across the wire")
    );
}

#[tokio::test]
async fn side_channel_accepts_only_the_expected_kind() {
    let chunks = vec![
        event(r#"{"kind":"followup","agent":"Alex","question":"Why?","message":"Because speed compounds."}"#),
        // A foreign kind on the side channel must be ignored.
        argument_event("Alex", "should not appear"),
    ];
    let addr = serve_stream(chunks, Duration::ZERO, false).await;

    let state = fresh_state("t");
    let controller = InteractionController::new();
    let appended = controller
        .ask_followup(&client_for(addr), &state, "optimist", "Why?")
        .await
        .unwrap();
    assert_eq!(appended, 1);
    assert!(!controller.is_in_flight());

    let st = state.lock().await;
    assert_eq!(st.transcript.len(), 1);
    assert_eq!(st.transcript.entries()[0].kind_label(), "followup");
}

#[tokio::test]
async fn side_channel_results_after_reset_are_discarded() {
    let chunks = vec![event(
        r#"{"kind":"followup","agent":"Alex","message":"Too late."}"#,
    )];
    // Events only arrive after the debate has been reset underneath.
    let addr = serve_stream(chunks, Duration::from_millis(400), false).await;

    let state = fresh_state("old topic");
    let controller = InteractionController::new();
    let client = Arc::new(client_for(addr));

    let request = tokio::spawn({
        let controller = controller.clone();
        let client = Arc::clone(&client);
        let state = Arc::clone(&state);
        async move {
            controller
                .ask_followup(&client, &state, "optimist", "Why?")
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    state.lock().await.reset("new topic");

    let appended = tokio::time::timeout(Duration::from_secs(5), request)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(appended, 0);

    let st = state.lock().await;
    assert!(st.transcript.is_empty());
    assert_eq!(st.transcript.topic, "new topic");
}

#[tokio::test]
async fn concurrent_interaction_is_rejected_while_in_flight() {
    let chunks = vec![event(
        r#"{"kind":"followup","agent":"Alex","message":"Slow answer."}"#,
    )];
    let addr = serve_stream(chunks, Duration::from_millis(500), false).await;

    let state = fresh_state("t");
    let controller = InteractionController::new();
    let client = Arc::new(client_for(addr));

    let first = tokio::spawn({
        let controller = controller.clone();
        let client = Arc::clone(&client);
        let state = Arc::clone(&state);
        async move {
            controller
                .ask_followup(&client, &state, "optimist", "Q1")
                .await
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(controller.is_in_flight());
    let err = controller
        .ask_followup(&client, &state, "skeptic", "Q2")
        .await
        .unwrap_err();
    assert!(matches!(err, InteractionError::AlreadyInFlight));

    let appended = tokio::time::timeout(Duration::from_secs(5), first)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(appended, 1);
    assert!(!controller.is_in_flight());
}
