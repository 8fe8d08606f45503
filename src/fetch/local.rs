use std::path::PathBuf;

use tokio::fs;
use tracing::debug;

use super::{fetch_error, workbook_path, SourceFetcher};
use crate::error::HvsError;

/// Reads previously downloaded workbooks from a directory.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    dir: PathBuf,
}

impl LocalFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SourceFetcher for LocalFetcher {
    async fn fetch(&self, source_id: &str) -> Result<Vec<u8>, HvsError> {
        let path = workbook_path(&self.dir, source_id);
        let bytes = fs::read(&path)
            .await
            .map_err(|e| fetch_error(source_id, format!("reading {}: {e}", path.display())))?;
        debug!(source_id, path = %path.display(), len = bytes.len(), "read local workbook");
        Ok(bytes)
    }
}
