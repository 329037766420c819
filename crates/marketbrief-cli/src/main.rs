use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketbrief_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "marketbrief")]
#[command(author, version, about = "Market news ingestion and summarization batch jobs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the configuration file (defaults to ~/.config/marketbrief/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all feeds and store new relevant articles (default)
    Ingest,
    /// Re-summarize stored articles whose summary exceeds the word cap
    EnforceWordCap {
        /// Maximum number of articles to process
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Generate missing secondary-language summaries
    BackfillSecondary {
        /// Maximum number of articles to process
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Print the validated feed registry
    Feeds,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configuration errors are fatal before anything else starts
    let config = AppConfig::load(cli.config.as_deref())?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Some(Commands::Ingest) | None => commands::ingest::run(&config).await,
        Some(Commands::EnforceWordCap { limit }) => commands::word_cap::run(&config, limit).await,
        Some(Commands::BackfillSecondary { limit }) => commands::backfill::run(&config, limit).await,
        Some(Commands::Feeds) => commands::feeds::run(&config),
    }
}
