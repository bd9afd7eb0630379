//! Build pipeline orchestration.
//!
//! Coordinates the full corpus build: raw export discovery → document
//! composition → batched embedding → index construction → snapshot
//! persistence. The pipeline is an offline batch job; it writes both
//! snapshot artifacts before touching the manifest, so a concurrent
//! reader never follows the pointer to a half-written pair.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;

use crate::compose;
use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::index::FlatIndex;
use crate::models::{Document, RawPage, RawTicket};
use crate::store::Snapshot;

/// File-name prefixes written by the acquisition export.
const TICKETS_PREFIX: &str = "jira_tickets_";
const PAGES_PREFIX: &str = "confluence_pages_";

pub fn run_build(config: &Config) -> Result<()> {
    let raw_dir = &config.data.raw_dir;

    let tickets_file = latest_export(raw_dir, TICKETS_PREFIX)?;
    let pages_file = latest_export(raw_dir, PAGES_PREFIX)?;
    println!("Using files:");
    println!("  tickets: {}", tickets_file.display());
    println!("  pages:   {}", pages_file.display());

    let tickets: Vec<RawTicket> = read_export(&tickets_file)?;
    let pages: Vec<RawPage> = read_export(&pages_file)?;

    let mut documents: Vec<Document> = Vec::with_capacity(tickets.len() + pages.len());
    let mut skipped = 0usize;

    for ticket in &tickets {
        match compose::compose_ticket(ticket) {
            Some(doc) => documents.push(doc),
            None => skipped += 1,
        }
    }
    let ticket_docs = documents.len();

    for page in &pages {
        match compose::compose_page(page) {
            Some(doc) => documents.push(doc),
            None => skipped += 1,
        }
    }
    let page_docs = documents.len() - ticket_docs;

    tracing::info!(
        tickets = ticket_docs,
        pages = page_docs,
        skipped,
        "composed documents"
    );

    let provider = embedding::global_provider(&config.embedding)?;

    let texts: Vec<String> = documents.iter().map(|doc| doc.text.clone()).collect();
    let vectors = provider
        .embed(&texts)
        .context("Failed to embed document corpus")?;

    let index = FlatIndex::build(provider.dims(), vectors)?;
    let snapshot = Snapshot::new(index, documents)?;

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let manifest = snapshot.persist(&config.data.snapshot_dir, &timestamp)?;

    println!("build");
    println!("  ticket documents: {ticket_docs}");
    println!("  page documents: {page_docs}");
    println!("  skipped (empty text): {skipped}");
    println!("  embedding model: {} ({} dims)", provider.model_name(), provider.dims());
    println!("  index: {}", manifest.index_path.display());
    println!("  documents: {}", manifest.documents_path.display());
    println!("  snapshot timestamp: {}", manifest.timestamp);
    println!("ok");

    Ok(())
}

/// Find the most recent export file with the given prefix.
///
/// Export names embed a timestamp (`<prefix><ts>.json`), so the
/// lexicographically greatest name is the newest.
fn latest_export(dir: &Path, prefix: &str) -> Result<PathBuf> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read data dir: {}", dir.display()))?;

    let mut matches: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix) && name.ends_with(".json"))
        })
        .collect();

    matches.sort();
    match matches.pop() {
        Some(path) => Ok(path),
        None => bail!(
            "No {}*.json files found in {}. Run the acquisition export first.",
            prefix,
            dir.display()
        ),
    }
}

fn read_export<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read export file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse export file: {}", path.display()))
}
