// src/fetch/http.rs
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{fs, time::sleep};
use tracing::{debug, error, info, warn};
use url::Url;

use super::{fetch_error, workbook_path, SourceFetcher};
use crate::config::PipelineConfig;
use crate::error::HvsError;

/// Downloads `<base_url>/<source_id>.xlsx`, retrying with exponential backoff,
/// and keeps a copy of every download in `raw_dir`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
    raw_dir: PathBuf,
    reuse_downloads: bool,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpFetcher {
    pub fn new(config: &PipelineConfig) -> Result<Self, HvsError> {
        let client = Client::builder()
            .timeout(config.fetch.timeout())
            .build()
            .map_err(|e| HvsError::config(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url()?,
            raw_dir: config.raw_dir.clone(),
            reuse_downloads: config.reuse_downloads,
            max_retries: config.fetch.max_retries,
            initial_backoff: Duration::from_millis(config.fetch.initial_backoff_ms),
        })
    }

    pub fn source_url(&self, source_id: &str) -> Result<Url, HvsError> {
        self.base_url
            .join(&format!("{source_id}.xlsx"))
            .map_err(|e| fetch_error(source_id, format!("building URL: {e}")))
    }

    async fn download(&self, source_id: &str) -> Result<Vec<u8>> {
        let url = self.source_url(source_id)?;
        let bytes =
            get_bytes_with_retry(&self.client, &url, self.max_retries, self.initial_backoff)
                .await?;

        let dest = workbook_path(&self.raw_dir, source_id);
        fs::create_dir_all(&self.raw_dir)
            .await
            .with_context(|| format!("creating {}", self.raw_dir.display()))?;
        fs::write(&dest, &bytes)
            .await
            .with_context(|| format!("saving {}", dest.display()))?;
        info!(source_id, %url, len = bytes.len(), dest = %dest.display(), "downloaded");
        Ok(bytes)
    }
}

impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, source_id: &str) -> Result<Vec<u8>, HvsError> {
        if self.reuse_downloads {
            let cached = workbook_path(&self.raw_dir, source_id);
            if let Ok(bytes) = fs::read(&cached).await {
                info!(source_id, path = %cached.display(), "using cached download");
                return Ok(bytes);
            }
        }
        self.download(source_id)
            .await
            .map_err(|e| fetch_error(source_id, format!("{e:#}")))
    }
}

async fn get_bytes_core(client: &Client, url: &Url) -> Result<Vec<u8>> {
    debug!("Fetching {}", url);
    let bytes = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .bytes()
        .await
        .with_context(|| format!("Reading body from {}", url))?;
    Ok(bytes.to_vec())
}

/// Bounded retry: the first attempt plus `max_retries` more, waiting
/// `initial_backoff * 2^(n-1)` before retry `n`.
async fn get_bytes_with_retry(
    client: &Client,
    url: &Url,
    max_retries: u32,
    initial_backoff: Duration,
) -> Result<Vec<u8>> {
    let mut attempts = 0;
    loop {
        match get_bytes_core(client, url).await {
            Ok(b) => return Ok(b),
            Err(e) if attempts < max_retries => {
                attempts += 1;
                let backoff = backoff_delay(initial_backoff, attempts);
                warn!(%url, attempt = attempts, delay_ms = backoff.as_millis() as u64, error = %e, "Retrying");
                sleep(backoff).await;
            }
            Err(e) => {
                error!(%url, error = %e, "Exhausted retries");
                return Err(e);
            }
        }
    }
}

/// `initial * 2^(retry-1)`, saturating instead of overflowing.
fn backoff_delay(initial: Duration, retry: u32) -> Duration {
    initial.saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
}
