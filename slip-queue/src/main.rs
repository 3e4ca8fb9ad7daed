//! slip-queue - Inspect and replay the offline action queue
//!
//! Unix-style tool for managing the durable action queue.

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use libslipstream::service::queue::MAX_REPLAY_ATTEMPTS;
use libslipstream::service::SlipstreamService;
use libslipstream::{ActionKind, ActionReplayer, QueuedAction, RemoteError, Result, SlipstreamError};

#[derive(Parser, Debug)]
#[command(name = "slip-queue")]
#[command(version)]
#[command(about = "Inspect and replay the offline action queue")]
#[command(long_about = "\
slip-queue - Inspect and replay the offline action queue

DESCRIPTION:
    slip-queue is a Unix-style tool for managing Slipstream's durable action
    queue. Actions that could not reach the backend wait here; use this tool
    to inspect them, feed them back through a replay command, or discard them.

COMMANDS:
    list        List pending actions
    add         Enqueue an action
    drain       Replay pending actions through a command
    clear       Discard all pending actions
    stats       Show queue statistics

USAGE EXAMPLES:
    # List pending actions
    slip-queue list

    # List pending actions in JSON format
    slip-queue list --format json

    # Enqueue a like action
    echo '{\"thread_id\": \"t1\"}' | slip-queue add like

    # Replay the queue (each action arrives as JSON on the command's stdin,
    # exit status 0 removes it from the queue)
    slip-queue drain --exec 'curl -sf -d @- https://api.example.com/replay'

    # Discard everything without confirmation
    slip-queue clear --force

    # View queue statistics
    slip-queue stats

CONFIGURATION:
    Configuration file: ~/.config/slipstream/config.toml
    Database location: ~/.local/share/slipstream/actions.db

    Override with environment variables:
        SLIPSTREAM_CONFIG    - Path to config file
        SLIPSTREAM_DB_PATH   - Path to database file

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Database or configuration error
    3 - Invalid input (bad action kind, malformed payload, etc.)

For more information, visit: https://github.com/slipstream-tools/slipstream
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    #[arg(help = "Enable verbose logging to stderr (useful for debugging)")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List pending actions
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Filter by action kind (like, comment, post, bookmark)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Enqueue an action
    Add {
        /// Action kind (like, comment, post, bookmark)
        kind: String,

        /// JSON payload (reads from stdin if not provided)
        payload: Option<String>,
    },

    /// Replay pending actions through a command
    Drain {
        /// Command to run per action; receives the action as JSON on stdin,
        /// exit status 0 marks the action as replayed
        #[arg(short, long, value_name = "COMMAND")]
        exec: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Discard all pending actions
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show queue statistics
    Stats {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("error")
            .with_writer(std::io::stderr)
            .init();
    }

    // Run the main logic and handle errors
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration and open the database
    let service = SlipstreamService::new().await?;

    // Execute command
    match cli.command {
        Commands::List { format, kind } => {
            cmd_list(&service, &format, kind.as_deref()).await?;
        }
        Commands::Add { kind, payload } => {
            cmd_add(&service, &kind, payload).await?;
        }
        Commands::Drain { exec, format } => {
            cmd_drain(&service, &exec, &format).await?;
        }
        Commands::Clear { force } => {
            cmd_clear(&service, force).await?;
        }
        Commands::Stats { format } => {
            cmd_stats(&service, &format).await?;
        }
    }

    service.dispose().await;

    Ok(())
}

/// List pending actions
async fn cmd_list(service: &SlipstreamService, format: &str, kind: Option<&str>) -> Result<()> {
    // Validate format
    if format != "text" && format != "json" {
        return Err(SlipstreamError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }

    let mut actions = service.queue().pending().await?;

    // Filter by kind if specified
    if let Some(kind) = kind {
        let kind: ActionKind = kind.parse()?;
        actions.retain(|a| a.kind == kind);
    }

    // Output based on format
    if format == "json" {
        output_list_json(&actions);
    } else {
        output_list_text(&actions);
    }

    Ok(())
}

/// Output actions as JSON
fn output_list_json(actions: &[QueuedAction]) {
    let json: Vec<serde_json::Value> = actions
        .iter()
        .map(|a| {
            serde_json::json!({
                "id": a.id,
                "kind": a.kind,
                "payload": a.payload,
                "enqueued_at": a.enqueued_at,
                "attempts": a.attempts,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json).unwrap());
}

/// Output actions as human-readable text
fn output_list_text(actions: &[QueuedAction]) {
    use chrono::Utc;

    if actions.is_empty() {
        return;
    }

    let now = Utc::now().timestamp();

    for action in actions {
        println!(
            "{} | {} | {} | {} attempt{}",
            action.id,
            action.kind,
            format_age(now, action.enqueued_at),
            action.attempts,
            if action.attempts == 1 { "" } else { "s" }
        );
    }
}

/// Format how long ago an action was enqueued
fn format_age(now: i64, enqueued_at: i64) -> String {
    let diff = now - enqueued_at;

    if diff < 0 {
        return "just now".to_string();
    }

    let minutes = diff / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else if hours > 0 {
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if minutes > 0 {
        format!("{} minute{} ago", minutes, if minutes == 1 { "" } else { "s" })
    } else {
        "just now".to_string()
    }
}

/// Enqueue an action
async fn cmd_add(service: &SlipstreamService, kind: &str, payload: Option<String>) -> Result<()> {
    let kind: ActionKind = kind.parse()?;

    // Read payload from argument or stdin
    let raw = match payload {
        Some(payload) => payload,
        None => {
            use std::io::Read;
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| {
                    SlipstreamError::InvalidInput(format!("Failed to read payload from stdin: {}", e))
                })?;
            buffer
        }
    };

    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SlipstreamError::InvalidInput(
            "No payload provided (pass JSON as an argument or pipe it on stdin)".to_string(),
        ));
    }

    let payload: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| SlipstreamError::InvalidInput(format!("Payload is not valid JSON: {}", e)))?;

    let action = service.queue().enqueue(kind, payload).await;

    // Print the id so scripts can capture it
    println!("{}", action.id);

    Ok(())
}

/// Replays actions by piping them to a shell command.
///
/// Each action is serialized as one JSON object on the command's stdin.
/// Exit status 0 counts as a successful replay; any other status leaves
/// the action queued for a later pass.
struct CommandReplayer {
    command: String,
}

#[async_trait]
impl ActionReplayer for CommandReplayer {
    async fn replay(&self, action: &QueuedAction) -> Result<bool> {
        use std::process::Stdio;
        use tokio::io::AsyncWriteExt;

        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| {
                RemoteError::new(
                    None,
                    Some(format!("Failed to run '{}': {}", self.command, e)),
                )
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let json = serde_json::to_string(action)
                .map_err(libslipstream::error::StorageError::SerializationError)?;
            // The command may exit without reading its stdin; a broken
            // pipe here is not a replay failure
            let _ = stdin.write_all(json.as_bytes()).await;
            let _ = stdin.write_all(b"\n").await;
        }

        let status = child.wait().await.map_err(|e| {
            RemoteError::new(None, Some(format!("Failed to wait for '{}': {}", self.command, e)))
        })?;

        Ok(status.success())
    }
}

/// Replay pending actions through a command
async fn cmd_drain(service: &SlipstreamService, exec: &str, format: &str) -> Result<()> {
    // Validate format
    if format != "text" && format != "json" {
        return Err(SlipstreamError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }

    let replayer = CommandReplayer {
        command: exec.to_string(),
    };
    let report = service.queue().drain(&replayer).await;

    if format == "json" {
        let json = serde_json::json!({
            "replayed": report.replayed,
            "retained": report.retained,
            "dropped": report.dropped,
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap());
    } else {
        println!(
            "{} replayed, {} retained, {} dropped",
            report.replayed, report.retained, report.dropped
        );
    }

    Ok(())
}

/// Discard all pending actions
async fn cmd_clear(service: &SlipstreamService, force: bool) -> Result<()> {
    // An unreadable snapshot (corrupted JSON, storage trouble) must not stop
    // a reset; the count is simply unknown and the discard proceeds.
    let pending = match service.queue().pending().await {
        Ok(actions) => Some(actions.len()),
        Err(e) => {
            eprintln!("Warning: could not read the queue snapshot: {}", e);
            None
        }
    };

    if pending == Some(0) {
        println!("Queue is empty");
        return Ok(());
    }

    // Confirm unless --force is used or stdin is not a terminal
    if !force && atty::is(atty::Stream::Stdin) {
        use std::io::{self, Write};
        match pending {
            Some(count) => print!(
                "Discard {} pending action{}? [y/N]: ",
                count,
                if count == 1 { "" } else { "s" }
            ),
            None => print!("Discard all pending actions? [y/N]: "),
        }
        io::stdout()
            .flush()
            .map_err(|e| SlipstreamError::InvalidInput(format!("Failed to flush stdout: {}", e)))?;

        let mut input = String::new();
        io::stdin().read_line(&mut input).map_err(|e| {
            SlipstreamError::InvalidInput(format!("Failed to read confirmation: {}", e))
        })?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled");
            return Ok(());
        }
    }

    service.queue().clear().await;

    match pending {
        Some(count) => println!(
            "✓ Cleared {} pending action{}",
            count,
            if count == 1 { "" } else { "s" }
        ),
        None => println!("✓ Cleared the queue"),
    }

    Ok(())
}

/// Show queue statistics
async fn cmd_stats(service: &SlipstreamService, format: &str) -> Result<()> {
    use chrono::Utc;

    // Validate format
    if format != "text" && format != "json" {
        return Err(SlipstreamError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }

    let actions = service.queue().pending().await?;

    let kinds = [
        ActionKind::Like,
        ActionKind::Comment,
        ActionKind::Post,
        ActionKind::Bookmark,
    ];

    if format == "json" {
        let mut by_kind = serde_json::Map::new();
        for kind in kinds {
            let count = actions.iter().filter(|a| a.kind == kind).count();
            by_kind.insert(kind.to_string(), serde_json::json!(count));
        }

        // Snapshots only ever hold attempts below the cap
        let mut by_attempts = serde_json::Map::new();
        for attempts in 0..MAX_REPLAY_ATTEMPTS {
            let count = actions.iter().filter(|a| a.attempts == attempts).count();
            by_attempts.insert(attempts.to_string(), serde_json::json!(count));
        }

        let json = serde_json::json!({
            "pending": actions.len(),
            "by_kind": by_kind,
            "by_attempts": by_attempts,
            "oldest_enqueued_at": actions.first().map(|a| a.enqueued_at),
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap());
    } else {
        println!("Pending actions: {}", actions.len());

        for kind in kinds {
            let count = actions.iter().filter(|a| a.kind == kind).count();
            if count > 0 {
                println!("  {}: {}", kind, count);
            }
        }

        for attempts in 0..MAX_REPLAY_ATTEMPTS {
            let count = actions.iter().filter(|a| a.attempts == attempts).count();
            if count > 0 {
                println!(
                    "  {} failed attempt{}: {}",
                    attempts,
                    if attempts == 1 { "" } else { "s" },
                    count
                );
            }
        }

        if let Some(oldest) = actions.first() {
            let now = Utc::now().timestamp();
            println!("Oldest: {}", format_age(now, oldest.enqueued_at));
        }
    }

    Ok(())
}
