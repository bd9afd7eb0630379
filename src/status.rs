//! The `status` command: report the current snapshot, if any.

use anyhow::Result;

use crate::config::Config;
use crate::error::RecallError;
use crate::manifest;

pub fn run_status(config: &Config) -> Result<()> {
    match manifest::read_manifest(&config.data.snapshot_dir) {
        Ok(manifest) => {
            println!("latest snapshot");
            println!("  timestamp: {}", manifest.timestamp);
            println!("  documents: {}", manifest.total_documents);
            println!("  index: {}", manifest.index_path.display());
            println!("  store: {}", manifest.documents_path.display());
        }
        Err(RecallError::NoSnapshot) => {
            println!("No snapshot yet. Run `recall build` first.");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
