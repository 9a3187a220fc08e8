//! share-relay CLI
//!
//! Local execution entry point. The host drops `config.toml` into the storage
//! directory and either pipes messages through `listen` or calls `handle`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use share_relay::{
    error::Result,
    models::{Config, HistorySnapshot},
    pipeline::{self, Outcome, Relay},
    storage::{HistoryStore, LocalStorage},
};

/// share-relay - 115 share link relay
#[derive(Parser, Debug)]
#[command(
    name = "share-relay",
    version,
    about = "Saves 115 share links from chat messages and announces them to WeCom"
)]
struct Cli {
    /// Path to storage directory containing config.toml
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a single chat message
    Handle {
        /// Message text
        #[arg(short, long)]
        text: String,

        /// Who sent the message
        #[arg(long, default_value = "unknown")]
        sender: String,
    },

    /// Read JSON-line messages from stdin until EOF
    Listen,

    /// Transfer a share link without notification or history
    Save {
        /// Share link (mirror links are accepted)
        link: String,
    },

    /// Show recent operations
    History {
        /// Number of entries (default: relay.history_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .target(env_logger::Target::Stderr)
        .init();
}

fn print_outcome(outcome: &Outcome) {
    match outcome.title() {
        Some(title) => println!("{} {}", outcome.label(), title),
        None => match outcome {
            Outcome::Error(message) => println!("{} {}", outcome.label(), message),
            _ => println!("{}", outcome.label()),
        },
    }
}

fn print_history(snapshot: &HistorySnapshot) {
    if snapshot.history.is_empty() {
        println!("No history yet.");
        return;
    }
    for entry in &snapshot.history {
        println!(
            "{}  {:<24}  {:<12}  {}{}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.status.to_string(),
            entry.sender,
            entry.original_url,
            entry
                .title
                .as_deref()
                .map(|t| format!("  [{t}]"))
                .unwrap_or_default()
        );
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let storage = LocalStorage::new(&cli.storage_dir);
    let config = Config::load_or_default(storage.config_path());
    log::debug!("Loaded configuration from {}", cli.storage_dir.display());

    match cli.command {
        Command::Handle { text, sender } => {
            let relay = Relay::new(config, Arc::new(storage))?;
            let outcome = relay.handle_message(&text, &sender).await;
            print_outcome(&outcome);
        }

        Command::Listen => {
            let relay = Relay::new(config, Arc::new(storage))?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let summary = pipeline::listen(&relay, stdin).await;

            log::info!(
                "Processed {} messages ({} malformed)",
                summary.received,
                summary.invalid
            );
            for (label, count) in &summary.outcomes {
                log::info!("  {}: {}", label, count);
            }
        }

        Command::Save { link } => {
            let relay = Relay::new(config, Arc::new(storage))?;
            match relay.save_link(&link).await {
                Ok(result) if result.success => match result.job_or_pick_code {
                    Some(code) => println!("✅ Saved {link} ({code})"),
                    None => println!("✅ Saved {link}"),
                },
                Ok(_) => println!("❌ Transfer rejected for {link}"),
                Err(e) => {
                    println!("❌ {e}");
                    return Err(e);
                }
            }
        }

        Command::History { limit, json } => {
            let limit = limit.unwrap_or(config.relay.history_limit);
            let store = HistoryStore::open(Arc::new(storage)).await?;
            let snapshot = HistorySnapshot {
                history: store.list(limit).await,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_history(&snapshot);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            if config.is_ready() {
                log::info!("✓ Relay is enabled and ready");
            } else {
                log::warn!(
                    "Relay will ignore messages (missing: {})",
                    config.missing_settings().join(", ")
                );
            }
        }
    }

    Ok(())
}
