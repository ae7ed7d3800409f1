//! Feedstream - replay scroll traces and session operation batches
//!
//! A thin command line front end over `feedstream-core`:
//! - Replays recorded scroll traces through the coalescing pipeline
//! - Applies operation batches to sessions journaled in SQLite
//! - Shows the materialized content of a session

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use feedstream_core::config::{self, FeedConfig};
use feedstream_core::session::Store;
use feedstream_core::storage::{Database, SqliteStore};

mod batch;
mod replay;

/// Feedstream - feed scroll and session tooling
#[derive(Parser)]
#[command(name = "feedstream")]
#[command(about = "Replay scroll traces and session operation batches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.feedstream/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long)]
    database: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON scroll trace and print the logged scrolls
    ReplayScroll {
        trace: PathBuf,

        /// Honour waits in wall-clock time instead of a simulated clock
        #[arg(long)]
        realtime: bool,
    },

    /// Apply a JSON operation batch to a session
    Apply {
        ops: PathBuf,

        #[arg(short, long)]
        session: String,
    },

    /// Show a session's materialized content
    Show {
        #[arg(short, long)]
        session: String,
    },

    /// List journaled sessions
    Sessions,
}

fn open_store(cli: &Cli, config: &FeedConfig) -> Result<Rc<SqliteStore>> {
    let path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.database_path());
    tracing::debug!("Opening database at {}", path.display());
    Ok(Rc::new(SqliteStore::new(Database::new(&path)?)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = FeedConfig::load(&config_path)?;

    match &cli.command {
        Commands::ReplayScroll { trace, realtime } => {
            let events = replay::load_trace(trace)?;
            tracing::info!("Replaying {} events from {}", events.len(), trace.display());

            let report = if *realtime {
                let local = tokio::task::LocalSet::new();
                local
                    .run_until(replay::replay_realtime(&events, &config.scroll))
                    .await
            } else {
                replay::replay(&events, &config.scroll)
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!("Logged scrolls ({}):", report.scrolls.len());
            for scroll in &report.scrolls {
                println!(
                    "  {:>+6} px  @ {} ms  ({:?})",
                    scroll.amount, scroll.at_millis, scroll.scroll_type
                );
            }
            println!("Content changed: {}", report.content_changed);
        }
        Commands::Apply { ops, session } => {
            let store = open_store(&cli, &config)?;
            let operations = batch::OperationBatch::load(ops)?;
            let outcome = batch::apply(&store, session, &operations)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
                return Ok(());
            }

            match outcome {
                batch::ApplyOutcome::Populated { journaled } => {
                    println!(
                        "Created session {} with {} structure(s)",
                        session,
                        operations.structures.len()
                    );
                    if !journaled {
                        println!("  ⚠ Journal write failed; changes were not persisted");
                    }
                }
                batch::ApplyOutcome::Updated { journaled } => {
                    println!(
                        "Applied {} structure(s) to session {}",
                        operations.structures.len(),
                        session
                    );
                    if !journaled {
                        println!("  ⚠ Journal write failed; changes were not persisted");
                    }
                }
                batch::ApplyOutcome::StaleToken => {
                    println!(
                        "Ignored batch: continuation token is not in session {}",
                        session
                    );
                }
            }
        }
        Commands::Show { session } => {
            let store = open_store(&cli, &config)?;
            let view = batch::show(&store, session)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
                return Ok(());
            }

            println!("Session {}", view.session_id);
            if view.content.is_empty() {
                println!("  (no content)");
            }
            for (depth, id) in &view.content {
                println!("  {}{}", "  ".repeat(*depth), id);
            }
            if let Some(position) = view.scroll_position {
                println!(
                    "Saved scroll position: item {} offset {}",
                    position.position, position.offset
                );
            }
        }
        Commands::Sessions => {
            let store = open_store(&cli, &config)?;
            let ids = store.session_ids()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&ids)?);
                return Ok(());
            }
            if ids.is_empty() {
                println!("No sessions.");
            }
            for id in ids {
                println!("  {}", id);
            }
        }
    }

    Ok(())
}
