//! Error taxonomy for snapshot loading and retrieval.
//!
//! The retrieval path must let callers tell apart conditions that look
//! similar from the outside: "no index has been built yet" is not the same
//! as "an index exists but its manifest is garbage", and neither is an
//! empty result set (which is `Ok`). [`RecallError`] makes each of those a
//! distinct variant. Build-side orchestration uses `anyhow` and wraps these
//! where it needs context.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the snapshot and retrieval layers.
#[derive(Debug, Error)]
pub enum RecallError {
    /// No manifest exists — no snapshot has ever been built.
    #[error("no snapshot available yet; run `recall build` first")]
    NoSnapshot,

    /// A manifest file exists but cannot be parsed. This is a
    /// data-integrity failure, never treated as an empty corpus.
    #[error("manifest at {path} is corrupt: {detail}")]
    CorruptManifest { path: PathBuf, detail: String },

    /// An index or document-store artifact is truncated or garbled.
    #[error("snapshot artifact {path} is corrupt: {detail}")]
    CorruptArtifact { path: PathBuf, detail: String },

    /// The index and document store disagree on cardinality. Positions in
    /// the index would no longer describe the documents at the same
    /// positions, so the snapshot is unusable.
    #[error("snapshot is misaligned: index holds {vectors} vectors but store holds {documents} documents")]
    MisalignedSnapshot { vectors: usize, documents: usize },

    /// A vector's dimension does not match the index dimension (wrong
    /// model, or a snapshot built with a different one).
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding provider failed (model missing, inference error).
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
