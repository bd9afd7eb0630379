//! The "latest snapshot" manifest.
//!
//! A single JSON record at a fixed location inside the snapshot directory
//! names the current index and document-store artifacts, so the search
//! path always loads the most recent build without knowing timestamped
//! file names. The record is overwritten wholesale on every build — there
//! is no history.
//!
//! Reading distinguishes two failure modes callers must treat very
//! differently: a missing manifest means "no snapshot has been built yet"
//! ([`RecallError::NoSnapshot`]), while a present-but-unparsable one is a
//! data-integrity error ([`RecallError::CorruptManifest`]) and must never
//! be misread as an empty corpus.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::RecallError;

/// Fixed manifest file name inside the snapshot directory.
pub const MANIFEST_FILE: &str = "latest.json";

/// Pointer record naming the current snapshot's artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub index_path: PathBuf,
    pub documents_path: PathBuf,
    pub timestamp: String,
    pub total_documents: usize,
}

/// Read the manifest from `dir`.
pub fn read_manifest(dir: &Path) -> Result<Manifest, RecallError> {
    let path = dir.join(MANIFEST_FILE);

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(RecallError::NoSnapshot),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|e| RecallError::CorruptManifest {
        path,
        detail: e.to_string(),
    })
}

/// Replace the manifest in `dir` wholesale.
///
/// The new record is written to a temp file and renamed into place, so a
/// concurrent reader sees either the old pointer or the new one, never a
/// partial write. Callers must have durably written both artifacts the
/// manifest names before calling this.
pub fn write_manifest(dir: &Path, manifest: &Manifest) -> Result<()> {
    let path = dir.join(MANIFEST_FILE);
    let tmp_path = dir.join(format!("{MANIFEST_FILE}.tmp"));

    let json = serde_json::to_string_pretty(manifest).context("Failed to encode manifest")?;
    std::fs::write(&tmp_path, json)
        .with_context(|| format!("Failed to write manifest: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, &path)
        .with_context(|| format!("Failed to replace manifest: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dir: &Path) -> Manifest {
        Manifest {
            index_path: dir.join("index_20240301_120000.bin"),
            documents_path: dir.join("documents_20240301_120000.bin"),
            timestamp: "20240301_120000".to_string(),
            total_documents: 42,
        }
    }

    #[test]
    fn test_read_missing_is_no_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_manifest(tmp.path()),
            Err(RecallError::NoSnapshot)
        ));
    }

    #[test]
    fn test_read_garbage_is_corrupt_not_missing() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_FILE), "{not json").unwrap();

        assert!(matches!(
            read_manifest(tmp.path()),
            Err(RecallError::CorruptManifest { .. })
        ));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = sample(tmp.path());

        write_manifest(tmp.path(), &manifest).unwrap();
        assert_eq!(read_manifest(tmp.path()).unwrap(), manifest);
    }

    #[test]
    fn test_write_replaces_wholesale() {
        let tmp = tempfile::tempdir().unwrap();

        let mut manifest = sample(tmp.path());
        write_manifest(tmp.path(), &manifest).unwrap();

        manifest.timestamp = "20240302_090000".to_string();
        manifest.total_documents = 7;
        write_manifest(tmp.path(), &manifest).unwrap();

        let read = read_manifest(tmp.path()).unwrap();
        assert_eq!(read.timestamp, "20240302_090000");
        assert_eq!(read.total_documents, 7);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let tmp = tempfile::tempdir().unwrap();
        write_manifest(tmp.path(), &sample(tmp.path())).unwrap();
        assert!(!tmp.path().join(format!("{MANIFEST_FILE}.tmp")).exists());
    }
}
