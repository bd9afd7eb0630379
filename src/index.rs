//! Flat vector index with exact inner-product search.
//!
//! Stores embeddings as one contiguous little-endian `f32` buffer and
//! answers k-nearest-neighbor queries with a full scan. At corpus sizes in
//! the thousands an exact scan is faster to build, trivially correct, and
//! reproducible across machines; no approximate structure is warranted.
//!
//! # Preconditions
//!
//! Vectors fed to both [`FlatIndex::build`] and [`FlatIndex::search`] must
//! already be L2-normalized by the caller — the index performs no
//! normalization of its own. Under that precondition inner product equals
//! cosine similarity, and the persisted artifact is byte-reproducible for
//! a given input order.
//!
//! # Storage format
//!
//! - Header (16 bytes): magic `ARIX`, format version (u32), dimension
//!   (u32), vector count (u32) — all little-endian
//! - Payload: `count × dims` little-endian `f32` values in insertion order

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::RecallError;

/// Magic bytes identifying an index artifact.
const MAGIC_BYTES: &[u8; 4] = b"ARIX";

/// Current artifact format version.
const FORMAT_VERSION: u32 = 1;

/// Size of the artifact header in bytes.
const HEADER_SIZE: usize = 16;

/// A single search hit: the vector's insertion position and its inner
/// product with the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub position: usize,
    pub score: f32,
}

/// In-memory flat index over fixed-dimension embedding vectors.
///
/// Position `i` in the index corresponds to position `i` in whatever
/// document sequence produced the vectors; the two are persisted together
/// as a snapshot and must never be reordered independently.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dims: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Build an index from all vectors at once.
    ///
    /// `dims` is the expected dimension (taken from the embedding
    /// provider), so an empty corpus still yields a dimensioned index.
    ///
    /// # Errors
    ///
    /// [`RecallError::DimensionMismatch`] if any vector's length differs
    /// from `dims`.
    pub fn build(dims: usize, vectors: Vec<Vec<f32>>) -> Result<Self, RecallError> {
        let mut data = Vec::with_capacity(dims * vectors.len());

        for vector in &vectors {
            if vector.len() != dims {
                return Err(RecallError::DimensionMismatch {
                    expected: dims,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        Ok(Self { dims, data })
    }

    /// Vector dimensionality.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dims == 0 {
            0
        } else {
            self.data.len() / self.dims
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn vector(&self, position: usize) -> &[f32] {
        let start = position * self.dims;
        &self.data[start..start + self.dims]
    }

    /// Return up to `k` positions ordered by descending inner product with
    /// `query`, ties broken by lower insertion position.
    ///
    /// An index holding fewer than `k` vectors returns all of them.
    ///
    /// # Errors
    ///
    /// [`RecallError::DimensionMismatch`] if `query` does not match the
    /// index dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, RecallError> {
        if query.len() != self.dims {
            return Err(RecallError::DimensionMismatch {
                expected: self.dims,
                actual: query.len(),
            });
        }

        let mut hits: Vec<SearchHit> = (0..self.len())
            .map(|position| SearchHit {
                position,
                score: dot(self.vector(position), query),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(k);

        Ok(hits)
    }

    /// Serialize the index to an artifact file.
    pub fn save(&self, path: &Path) -> Result<(), RecallError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC_BYTES)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        writer.write_all(&(self.dims as u32).to_le_bytes())?;
        writer.write_all(&(self.len() as u32).to_le_bytes())?;
        for value in &self.data {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Deserialize an index from an artifact file.
    ///
    /// # Errors
    ///
    /// [`RecallError::CorruptArtifact`] for a bad magic, unsupported
    /// version, or a payload whose length disagrees with the header.
    pub fn load(path: &Path) -> Result<Self, RecallError> {
        let bytes = std::fs::read(path)?;

        if bytes.len() < HEADER_SIZE {
            return Err(corrupt(path, "file shorter than header"));
        }
        if &bytes[0..4] != MAGIC_BYTES {
            return Err(corrupt(path, "bad magic bytes"));
        }

        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != FORMAT_VERSION {
            return Err(corrupt(
                path,
                &format!("unsupported format version {version}"),
            ));
        }

        let dims = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        let count = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;

        let payload = &bytes[HEADER_SIZE..];
        let expected_len = dims
            .checked_mul(count)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| corrupt(path, "header dimensions overflow"))?;
        if payload.len() != expected_len {
            return Err(corrupt(
                path,
                &format!(
                    "payload holds {} bytes, header promises {}",
                    payload.len(),
                    expected_len
                ),
            ));
        }

        let data: Vec<f32> = payload
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Ok(Self { dims, data })
    }
}

fn corrupt(path: &Path, detail: &str) -> RecallError {
    RecallError::CorruptArtifact {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
