//! Groundwire CLI — the main entry point.
//!
//! Commands:
//! - `serve` — Start the HTTP gateway
//! - `ask`   — Run a single turn and stream the answer to stdout

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod wiring;

#[derive(Parser)]
#[command(
    name = "groundwire",
    about = "Groundwire — conversational retrieval-augmented generation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to groundwire.toml
    #[arg(short, long, global = true, default_value = "groundwire.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question and stream the answer
    Ask {
        /// The question
        query: String,

        /// Thread to run the turn on
        #[arg(short, long, default_value = "cli")]
        thread: String,

        /// Load *.txt / *.md files from this directory into the in-memory
        /// store before asking (in_memory backend only)
        #[arg(long)]
        corpus: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = groundwire_config::AppConfig::load_from(&cli.config)?;
    config.apply_env_overrides();
    config.validate()?;

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Ask {
            query,
            thread,
            corpus,
        } => commands::ask::run(config, &query, &thread, corpus.as_deref()).await?,
    }

    Ok(())
}
