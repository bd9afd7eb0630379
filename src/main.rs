//! # Atlas Recall CLI (`recall`)
//!
//! The `recall` binary is the primary interface for Atlas Recall. It
//! provides commands for building the vector snapshot from raw exports,
//! searching it, and inspecting the current manifest.
//!
//! ## Usage
//!
//! ```bash
//! recall --config ./config/recall.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `recall build` | Compose, embed, and index the newest exports |
//! | `recall search "<query>"...` | Ranked similarity search over the snapshot |
//! | `recall status` | Show the current snapshot manifest |
//!
//! ## Examples
//!
//! ```bash
//! # Build a snapshot from ./data exports
//! recall build
//!
//! # Single-query search with the default 0.4 threshold
//! recall search "payment gateway timeout"
//!
//! # Stricter threshold, capped output
//! recall search "login flow" --threshold 0.6 --limit 5
//!
//! # Several generated queries, merged with first-occurrence dedup
//! recall search "gateway timeout" "checkout 504 error"
//! ```

mod compose;
mod config;
mod embedding;
mod error;
mod index;
mod ingest;
mod manifest;
mod models;
mod normalize;
mod search;
mod status;
mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Atlas Recall CLI — semantic retrieval over issue-tracker and wiki
/// exports.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; every setting has a working default, so the flag is optional.
#[derive(Parser)]
#[command(
    name = "recall",
    about = "Atlas Recall — semantic retrieval over issue-tracker and wiki exports",
    version,
    long_about = "Atlas Recall ingests flat JSON exports of issue-tracker tickets and wiki pages, \
    embeds them with a local sentence-embedding model, and serves ranked similarity search over a \
    persisted vector snapshot for AI-assisted ticket drafting."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/recall.toml`; a missing file falls back to
    /// built-in defaults.
    #[arg(long, global = true, default_value = "./config/recall.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Build a snapshot from the newest raw exports.
    ///
    /// Picks the latest `jira_tickets_*.json` and `confluence_pages_*.json`
    /// in the data dir, composes and embeds every record, builds the
    /// vector index, and persists a new snapshot. The manifest is updated
    /// only after both artifacts are durably written.
    Build,

    /// Search the latest snapshot.
    ///
    /// Embeds each query, scans the index, and prints candidates scoring
    /// at least the similarity threshold, ranked descending. With more
    /// than one query, results are merged in query order and deduplicated
    /// by URL (first occurrence wins).
    Search {
        /// One or more query strings.
        #[arg(required = true)]
        queries: Vec<String>,

        /// Minimum similarity score; overrides the configured default.
        #[arg(long)]
        threshold: Option<f32>,

        /// Maximum number of results to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the current snapshot manifest.
    Status,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Build => {
            ingest::run_build(&cfg)?;
        }
        Commands::Search {
            queries,
            threshold,
            limit,
        } => {
            let threshold = threshold.unwrap_or(cfg.retrieval.threshold);
            let limit = limit.unwrap_or(usize::MAX);
            search::run_search(&cfg, &queries, threshold, limit)?;
        }
        Commands::Status => {
            status::run_status(&cfg)?;
        }
    }

    Ok(())
}
