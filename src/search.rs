//! Retrieval service: embed → k-NN → threshold → rank → return.
//!
//! [`Retriever`] holds the loaded snapshot and the embedding provider for
//! the process lifetime; both are read-only after load, so nothing in the
//! query path needs locking. `search` answers a single query;
//! [`Retriever::search_many`] merges several independent queries with
//! first-occurrence-wins URL deduplication for the ticket-drafting
//! assistant.

use std::collections::HashSet;

use anyhow::Result;

use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::RecallError;
use crate::models::{Metadata, ScoredDocument};
use crate::store::Snapshot;

/// Characters of document text shown per CLI result.
const PREVIEW_CHARS: usize = 400;

/// Loaded snapshot plus embedding provider, ready to answer queries.
pub struct Retriever<'a> {
    snapshot: Snapshot,
    provider: &'a dyn EmbeddingProvider,
}

impl<'a> Retriever<'a> {
    /// Load the latest snapshot and the process-wide embedding model.
    ///
    /// # Errors
    ///
    /// [`RecallError::NoSnapshot`] when no build has run yet,
    /// [`RecallError::CorruptManifest`] / [`RecallError::CorruptArtifact`]
    /// for damaged snapshot files, [`RecallError::MisalignedSnapshot`] when
    /// index and store disagree on cardinality, and
    /// [`RecallError::DimensionMismatch`] when the snapshot was built with
    /// a model of a different dimension than the configured one.
    pub fn open(config: &Config) -> Result<Retriever<'static>, RecallError> {
        let snapshot = Snapshot::load_latest(&config.data.snapshot_dir)?;
        let provider = embedding::global_provider(&config.embedding)
            .map_err(|e| RecallError::Embedding(e.to_string()))?;

        Retriever::with_provider(snapshot, provider)
    }

    /// Pair an already-loaded snapshot with an explicit provider.
    ///
    /// Verifies up front that the provider and the snapshot agree on
    /// vector dimensionality, so a model upgrade surfaces as an
    /// incompatible-snapshot error instead of silently broken scores.
    pub fn with_provider(
        snapshot: Snapshot,
        provider: &'a dyn EmbeddingProvider,
    ) -> Result<Self, RecallError> {
        if !snapshot.is_empty() && snapshot.index().dims() != provider.dims() {
            return Err(RecallError::DimensionMismatch {
                expected: snapshot.index().dims(),
                actual: provider.dims(),
            });
        }
        Ok(Self { snapshot, provider })
    }

    /// Answer one natural-language query.
    ///
    /// Embeds the query (normalized the same way indexed vectors were),
    /// scans the index for the `candidate_k` nearest candidates, keeps
    /// those scoring at least `threshold`, and returns them sorted by
    /// descending similarity. An empty result is `Ok`, not an error.
    pub fn search(
        &self,
        query: &str,
        threshold: f32,
        candidate_k: usize,
    ) -> Result<Vec<ScoredDocument>, RecallError> {
        let query_vector = self
            .provider
            .embed_one(query)
            .map_err(|e| RecallError::Embedding(e.to_string()))?;
        self.search_with_vector(&query_vector, threshold, candidate_k)
    }

    /// The query path minus the embedding step: search with a precomputed,
    /// L2-normalized query vector.
    pub fn search_with_vector(
        &self,
        query_vector: &[f32],
        threshold: f32,
        candidate_k: usize,
    ) -> Result<Vec<ScoredDocument>, RecallError> {
        if self.snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self.snapshot.index().search(query_vector, candidate_k)?;

        let mut results: Vec<ScoredDocument> = hits
            .into_iter()
            .filter(|hit| hit.score >= threshold)
            .map(|hit| ScoredDocument {
                document: self.snapshot.documents()[hit.position].clone(),
                similarity_score: hit.score,
            })
            .collect();

        // Stable sort: equal scores keep the index's insertion-order
        // tie-break.
        results.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(results)
    }

    /// Merge the results of several independent queries.
    ///
    /// Result sequences are concatenated in query order, then deduplicated
    /// by URL keeping the first occurrence — the copy from the earliest
    /// query wins, not the highest-scoring one. Consumers rely on exactly
    /// this policy for which metadata and snippet they see.
    pub fn search_many(
        &self,
        queries: &[String],
        threshold: f32,
        candidate_k: usize,
    ) -> Result<Vec<ScoredDocument>, RecallError> {
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut merged = Vec::new();

        for query in queries {
            for result in self.search(query, threshold, candidate_k)? {
                if seen_urls.insert(result.document.url.clone()) {
                    merged.push(result);
                }
            }
        }

        Ok(merged)
    }
}

/// Run a search from the CLI and print ranked results.
pub fn run_search(config: &Config, queries: &[String], threshold: f32, limit: usize) -> Result<()> {
    let queries: Vec<String> = queries
        .iter()
        .filter(|q| !q.trim().is_empty())
        .cloned()
        .collect();
    if queries.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let retriever = Retriever::open(config)?;
    let candidate_k = config.retrieval.candidate_k;

    let mut results = if queries.len() == 1 {
        retriever.search(&queries[0], threshold, candidate_k)?
    } else {
        retriever.search_many(&queries, threshold, candidate_k)?
    };
    results.truncate(limit);

    if results.is_empty() {
        println!("No results with similarity >= {threshold}.");
        return Ok(());
    }

    println!(
        "Found {} related tickets/pages (similarity >= {}):",
        results.len(),
        threshold
    );
    println!("{}", "=".repeat(70));

    for (i, result) in results.iter().enumerate() {
        let doc = &result.document;
        let title = if doc.title.is_empty() {
            "(untitled)"
        } else {
            doc.title.as_str()
        };
        println!(
            "\n{}. [{}] {}",
            i + 1,
            doc.source.to_string().to_uppercase(),
            title
        );
        println!("   Similarity Score: {:.3}", result.similarity_score);
        if !doc.url.is_empty() {
            println!("   URL: {}", doc.url);
        }

        match &doc.metadata {
            Metadata::Ticket(meta) => {
                println!("   Status: {} | Priority: {}", meta.status, meta.priority);
                println!("   Type: {} | Assignee: {}", meta.issue_type, meta.assignee);
            }
            Metadata::Page(meta) => {
                println!("   Space: {}", meta.space_name);
            }
        }

        let preview: String = doc.text.chars().take(PREVIEW_CHARS).collect();
        if doc.text.chars().count() > PREVIEW_CHARS {
            println!("   Content: {preview}...");
        } else {
            println!("   Content: {preview}");
        }
        println!("{}", "-".repeat(70));
    }

    Ok(())
}
