use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use arena_client::{ArenaClient, ArenaConfig, SharedState, StartDebateRequest, StreamOutcome};
use transcript::{DebateState, Entry, SavedDebate, SavedDebates, SectionParser};

/// Stream a multi-agent debate and render it in the terminal.
#[derive(Parser)]
#[command(name = "arena-client")]
struct Args {
    /// Debate topic.
    topic: String,

    /// Number of debate rounds.
    #[arg(long, default_value_t = 2)]
    rounds: u32,

    /// Agent template names, comma separated (optimist, skeptic,
    /// pragmatist, innovator, veteran, devils_advocate, or one of the
    /// philosophers: kant, mill, aristotle, rawls, socrates, nietzsche).
    #[arg(long, value_delimiter = ',', default_value = "optimist,skeptic,pragmatist")]
    agents: Vec<String>,

    /// Save the finished transcript into this JSON library file
    /// (most-recent-first, capped at 10).
    #[arg(long)]
    library: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = ArenaConfig::default();
    info!(backend = %config.base_url, topic = %args.topic, "starting debate");

    let client = ArenaClient::new(config)?;
    let state: SharedState = Arc::new(tokio::sync::Mutex::new(DebateState::new()));
    state.lock().await.reset(&args.topic);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("cancellation requested");
                cancel.cancel();
            }
        }
    });

    let printer = tokio::spawn(print_live(Arc::clone(&state)));

    let request = StartDebateRequest {
        topic: args.topic.clone(),
        rounds: args.rounds,
        agent_templates: args.agents.clone(),
    };
    let outcome = client.run_debate(&request, &state, &cancel).await;
    printer.await.context("printer task failed")?;

    match outcome {
        Ok(StreamOutcome::Complete) => info!("debate complete"),
        Ok(StreamOutcome::Cancelled) => info!("debate cancelled; partial transcript retained"),
        Err(err) => warn!(error = %err, "debate stream failed; partial transcript retained"),
    }

    render_summary(&state).await;

    if let Some(path) = &args.library {
        save_to_library(&state, path).await?;
    }
    Ok(())
}

/// Poll the shared transcript and print entries as they arrive.
async fn print_live(state: SharedState) {
    let mut printed = 0;
    loop {
        let (fresh, done) = {
            let st = state.lock().await;
            (
                st.transcript.entries()[printed..].to_vec(),
                st.transcript.status.is_terminal(),
            )
        };
        for entry in &fresh {
            print_entry(entry);
            printed += 1;
        }
        if done {
            break;
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
}

fn print_entry(entry: &Entry) {
    match entry {
        Entry::Start { topic, agents, rounds } => {
            if let Some(topic) = topic {
                println!("\nDebate: {topic}");
            }
            let roster: Vec<&str> = agents.iter().map(|a| a.name.as_str()).collect();
            println!(
                "Debaters: {} ({} rounds)\n",
                roster.join(", "),
                rounds.unwrap_or(0)
            );
        }
        Entry::RoundStart { round, phase } => {
            println!("\n--- Round {round}: {} ---", phase.as_deref().unwrap_or(""));
        }
        Entry::CrossExamStart { message }
        | Entry::ClosingStart { message }
        | Entry::VotingStart { message } => {
            println!("\n--- {} ---", message.as_deref().unwrap_or("Next phase"));
        }
        Entry::Argument { agent, role, message, .. } => {
            println!("\n{agent} ({}):\n{message}", role.as_deref().unwrap_or("Debater"));
        }
        Entry::Followup { agent, message, .. } => {
            println!("\n{} (follow-up):\n{message}", agent.as_deref().unwrap_or("Agent"));
        }
        Entry::Response { agent, responding_to, message, .. } => {
            println!(
                "\n{} (responding to {}):\n{message}",
                agent.as_deref().unwrap_or("Agent"),
                responding_to.as_deref().unwrap_or("a prior point")
            );
        }
        Entry::CrossExamQuestion { questioner, target, message } => {
            println!("\n{questioner} asks {target}:\n{message}");
        }
        Entry::CrossExamResponse { responder, message, .. } => {
            println!("\n{responder} answers:\n{message}");
        }
        Entry::Closing { agent, message, .. } => {
            println!("\n{agent} (closing):\n{message}");
        }
        Entry::Vote { voter, vote_for, reason } => {
            println!(
                "\n{voter} votes for {vote_for}: {}",
                reason.as_deref().unwrap_or("no reason given")
            );
        }
        Entry::VotingResults { tally, .. } => {
            println!("\n--- Voting results ---");
            for (name, count) in tally {
                println!("  {name}: {count}");
            }
        }
        // The synthesis gets its structured rendering in the summary.
        Entry::Synthesis { .. } => {}
    }
}

/// Render synthesis entries through the section parser, falling back to
/// the raw message when no recognized sections are found.
async fn render_summary(state: &SharedState) {
    let st = state.lock().await;
    let parser = SectionParser::default();
    for entry in st.transcript.entries() {
        let Entry::Synthesis { message, .. } = entry else {
            continue;
        };
        println!("\n=== Synthesis ===");
        let sections = parser.parse(message);
        if sections.is_empty() {
            println!("{message}");
            continue;
        }
        for section in sections {
            println!("\n{}", section.title);
            if section.is_paragraph() {
                println!("  {}", section.bullets[0]);
            } else {
                for bullet in &section.bullets {
                    println!("  * {bullet}");
                }
            }
        }
    }
}

/// Append the transcript to the bounded saved-debate library file.
async fn save_to_library(state: &SharedState, path: &Path) -> Result<()> {
    let st = state.lock().await;
    if st.transcript.is_empty() {
        warn!("nothing to save; transcript is empty");
        return Ok(());
    }

    let mut library = match std::fs::read_to_string(path) {
        Ok(json) => SavedDebates::from_json(&json)
            .with_context(|| format!("corrupt library file {}", path.display()))?,
        Err(_) => SavedDebates::new(),
    };
    let id = library.save(SavedDebate::from_transcript(&st.transcript));
    std::fs::write(path, library.to_json()?)
        .with_context(|| format!("failed to write library file {}", path.display()))?;
    info!(id = %id, count = library.len(), "saved debate to library");
    Ok(())
}
