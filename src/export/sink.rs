//! Download sink for exported diagrams
//!
//! Delivery is two-phase: stage the bytes into a transient resource, then
//! commit them under the final filename. A staging handle dropped without
//! commit releases its resource, so no path leaks the transient file.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

pub trait DownloadSink: Send + Sync {
    /// Stage a payload for delivery.
    fn stage(&self, payload: &[u8]) -> Result<StagedDownload>;
}

/// A staged payload awaiting commit
pub struct StagedDownload {
    file: NamedTempFile,
    dir: PathBuf,
}

impl StagedDownload {
    /// Deliver the staged payload under `filename`, consuming the handle.
    pub fn commit(self, filename: &str) -> Result<PathBuf> {
        let target = self.dir.join(filename);
        self.file
            .persist(&target)
            .with_context(|| format!("failed to deliver {}", target.display()))?;
        Ok(target)
    }
}

/// Sink delivering downloads into a local directory
pub struct FileSystemSink {
    dir: PathBuf,
}

impl FileSystemSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for FileSystemSink {
    fn stage(&self, payload: &[u8]) -> Result<StagedDownload> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create export directory {}", self.dir.display()))?;
        let mut file =
            NamedTempFile::new_in(&self.dir).context("failed to stage download file")?;
        file.write_all(payload)
            .context("failed to write staged download")?;
        Ok(StagedDownload {
            file,
            dir: self.dir.clone(),
        })
    }
}
