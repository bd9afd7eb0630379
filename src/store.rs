//! Document store and snapshot persistence.
//!
//! The document store is an ordered sequence of [`Document`]s serialized
//! with bincode. Position `i` in the store corresponds to position `i` in
//! the vector index built from the same corpus; [`Snapshot::new`] is the
//! single place that pairing is established, and it refuses mismatched
//! lengths so the coupling can never drift silently.
//!
//! A snapshot's two artifacts share a build timestamp in their file names
//! (`index_<ts>.bin`, `documents_<ts>.bin`) and are immutable once
//! written; only the manifest pointer moves between builds.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::RecallError;
use crate::index::FlatIndex;
use crate::manifest::{self, Manifest};
use crate::models::Document;

/// A positionally aligned (vector index, document store) pair.
#[derive(Debug, Clone)]
pub struct Snapshot {
    index: FlatIndex,
    documents: Vec<Document>,
}

impl Snapshot {
    /// Pair an index with its document store.
    ///
    /// # Errors
    ///
    /// [`RecallError::MisalignedSnapshot`] when the cardinalities differ —
    /// position `i` in the index would no longer describe document `i`.
    pub fn new(index: FlatIndex, documents: Vec<Document>) -> Result<Self, RecallError> {
        if index.len() != documents.len() {
            return Err(RecallError::MisalignedSnapshot {
                vectors: index.len(),
                documents: documents.len(),
            });
        }
        Ok(Self { index, documents })
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Write both artifacts into `dir` and record them in the manifest.
    ///
    /// The manifest is written last, after both artifacts are on disk, so
    /// a reader following the manifest never observes a half-written pair.
    pub fn persist(&self, dir: &Path, timestamp: &str) -> Result<Manifest> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create snapshot dir: {}", dir.display()))?;

        let index_path = dir.join(format!("index_{timestamp}.bin"));
        let documents_path = dir.join(format!("documents_{timestamp}.bin"));

        self.index
            .save(&index_path)
            .with_context(|| format!("Failed to write index artifact: {}", index_path.display()))?;
        save_documents(&documents_path, &self.documents).with_context(|| {
            format!(
                "Failed to write document store artifact: {}",
                documents_path.display()
            )
        })?;

        let manifest = Manifest {
            index_path,
            documents_path,
            timestamp: timestamp.to_string(),
            total_documents: self.documents.len(),
        };
        manifest::write_manifest(dir, &manifest)?;

        Ok(manifest)
    }

    /// Load the latest snapshot recorded in `dir`'s manifest.
    pub fn load_latest(dir: &Path) -> Result<Self, RecallError> {
        let manifest = manifest::read_manifest(dir)?;
        let index = FlatIndex::load(&manifest.index_path)?;
        let documents = load_documents(&manifest.documents_path)?;
        Self::new(index, documents)
    }
}

/// Serialize an ordered document sequence to an artifact file.
pub fn save_documents(path: &Path, documents: &[Document]) -> Result<(), RecallError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, documents).map_err(|e| RecallError::CorruptArtifact {
        path: path.to_path_buf(),
        detail: format!("serialization failed: {e}"),
    })
}

/// Deserialize a document sequence from an artifact file, preserving
/// order.
pub fn load_documents(path: &Path) -> Result<Vec<Document>, RecallError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    bincode::deserialize_from(reader).map_err(|e| RecallError::CorruptArtifact {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}
