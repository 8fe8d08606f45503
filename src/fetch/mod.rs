// src/fetch/mod.rs
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::HvsError;

pub mod http;
pub mod local;

pub use http::HttpFetcher;
pub use local::LocalFetcher;

/// Resolves a source identifier (e.g. `tab4_msa_15_18_rvr`) to the raw bytes
/// of its workbook.
pub trait SourceFetcher {
    fn fetch(&self, source_id: &str) -> impl Future<Output = Result<Vec<u8>, HvsError>> + Send;
}

/// `<dir>/<source_id>.xlsx`
pub fn workbook_path(dir: impl AsRef<Path>, source_id: &str) -> PathBuf {
    dir.as_ref().join(format!("{source_id}.xlsx"))
}

pub(crate) fn fetch_error(source_id: &str, message: impl Into<String>) -> HvsError {
    HvsError::Fetch {
        source_id: source_id.to_string(),
        message: message.into(),
    }
}
