mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "compass")]
#[command(about = "Normalize, calibrate, and rank LLM benchmark data into model recommendations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a batch of raw catalog and score records from a JSON file
    Ingest {
        /// Path to a batch file ({"benchmarks": [...], "models": [...], "scores": [...]})
        file: PathBuf,
        /// Output the batch report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rebuild the semantic benchmark index from the current catalog
    Index,
    /// Search benchmark descriptions by free-text task description
    Search {
        /// Task description
        query: String,
        /// Number of results
        #[arg(short, long)]
        k: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rank models for a task under hard constraints
    Rank(cli::rank::RankArgs),
    /// List catalog contents
    List {
        #[command(subcommand)]
        what: ListCommands,
    },
}

#[derive(Subcommand)]
enum ListCommands {
    /// List models
    Models {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List benchmarks
    Benchmarks {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest { file, json } => cli::ingest::run(&file, json)?,
        Commands::Index => cli::index::run()?,
        Commands::Search { query, k, json } => cli::search::run(&query, k, json)?,
        Commands::Rank(args) => cli::rank::run(&args)?,
        Commands::List { what } => match what {
            ListCommands::Models { json } => cli::list::models(json)?,
            ListCommands::Benchmarks { json } => cli::list::benchmarks(json)?,
        },
    }

    Ok(())
}
