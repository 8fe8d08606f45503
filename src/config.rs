// src/config.rs
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::HvsError;
use crate::metric::{Era, Metric};
use crate::process::TableLayout;
use crate::reconcile::RenameMode;

pub const CONFIG_ENV: &str = "HVS_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "hvs.yaml";

const DEFAULT_BASE_URL: &str = "https://www.census.gov/housing/hvs/data/rates/";
pub const MAX_RETRIES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff before the first retry; doubled on each further retry.
    pub initial_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_retries: 3,
            initial_backoff_ms: 500,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layouts {
    pub early: TableLayout,
    pub late: TableLayout,
}

impl Layouts {
    pub fn for_era(&self, era: Era) -> &TableLayout {
        match era {
            Era::Early => &self.early,
            Era::Late => &self.late,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory URL the `<source_id>.xlsx` workbooks are fetched from.
    pub base_url: String,
    /// Downloaded workbooks are kept here.
    pub raw_dir: PathBuf,
    pub out_dir: PathBuf,
    pub rename_mode: RenameMode,
    pub output_format: OutputFormat,
    pub metrics: Vec<Metric>,
    /// Read workbooks from `raw_dir` only; never touch the network.
    pub offline: bool,
    /// Use a workbook already in `raw_dir` instead of downloading it again.
    pub reuse_downloads: bool,
    pub fetch: FetchConfig,
    pub layouts: Layouts,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            raw_dir: PathBuf::from("raw"),
            out_dir: PathBuf::from("output"),
            rename_mode: RenameMode::default(),
            output_format: OutputFormat::default(),
            metrics: Metric::ALL.to_vec(),
            offline: false,
            reuse_downloads: false,
            fetch: FetchConfig::default(),
            layouts: Layouts::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from `$HVS_CONFIG`, else `./hvs.yaml` if it exists, else defaults;
    /// then apply environment overrides.
    pub fn load() -> Result<Self, HvsError> {
        let mut config = match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            Err(_) => {
                debug!("no config file, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HvsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| HvsError::config(format!("reading {}: {e}", path.display())))?;
        let config = Self::from_yaml(&text)
            .map_err(|e| HvsError::config(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// `HVS_RENAME_MODE`, `HVS_OUT_DIR`, `HVS_RAW_DIR` and `HVS_OFFLINE`
    /// take precedence over the file.
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<(), HvsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = var("HVS_RENAME_MODE") {
            self.rename_mode = mode.parse()?;
        }
        if let Some(dir) = var("HVS_OUT_DIR") {
            self.out_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("HVS_RAW_DIR") {
            self.raw_dir = PathBuf::from(dir);
        }
        if let Some(flag) = var("HVS_OFFLINE") {
            self.offline = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(HvsError::config(format!(
                        "HVS_OFFLINE must be true or false, got {other:?}"
                    )))
                }
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), HvsError> {
        self.base_url()?;
        if self.metrics.is_empty() {
            return Err(HvsError::config("no metrics selected"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(HvsError::config("fetch.timeout_secs must be positive"));
        }
        if self.fetch.max_retries > MAX_RETRIES {
            return Err(HvsError::config(format!(
                "fetch.max_retries must be at most {MAX_RETRIES}, got {}",
                self.fetch.max_retries
            )));
        }
        Ok(())
    }

    /// Base URL with a trailing slash so `join` appends rather than replaces.
    pub fn base_url(&self) -> Result<Url, HvsError> {
        let mut raw = self.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|e| HvsError::config(format!("base_url {raw:?}: {e}")))
    }

    pub fn output_path(&self, metric: Metric) -> PathBuf {
        self.out_dir.join(format!(
            "{}.{}",
            metric.spec().output_stem,
            self.output_format.extension()
        ))
    }
}
