//! Persisted dashboard artifact
//!
//! Readers of the artifact path see either the previous document or the new
//! one in full, never a partial write.

use crate::error::PersistError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Staging file next to the target so the final rename stays on one filesystem
    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dashboard".to_string());
        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        self.path
            .with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), seq))
    }

    /// Replace the artifact with `html`
    pub async fn publish(&self, html: &str) -> Result<(), PersistError> {
        let staged = self.staging_path();

        if let Err(source) = write_synced(&staged, html.as_bytes()).await {
            let _ = fs::remove_file(&staged).await;
            return Err(PersistError::Write {
                path: staged,
                source,
            });
        }

        if let Err(source) = fs::rename(&staged, &self.path).await {
            let _ = fs::remove_file(&staged).await;
            return Err(PersistError::Replace {
                path: self.path.clone(),
                source,
            });
        }

        Ok(())
    }

    /// The current artifact, or `None` before the first publish
    pub async fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(html) => Ok(Some(html)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}
