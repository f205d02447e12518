//! # Ingest Configuration
//!
//! Layered as: defaults, then an optional JSON file, then `LI_*`
//! environment variables, then command-line flags (applied by the CLI).

use std::path::{Path, PathBuf};

use li_03_page_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Page scheduling and retry configuration.
    pub sync: SyncConfig,
    /// Block source configuration.
    pub source: SourceConfig,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which key-value store backs the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Append-only record log.
    #[default]
    File,
    /// RocksDB (requires the `rocksdb` feature).
    RocksDb,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "rocksdb" => Ok(StorageBackend::RocksDb),
            other => Err(format!("unknown storage backend {other:?}")),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory.
    pub data_dir: PathBuf,
    /// Backend.
    pub backend: StorageBackend,
    /// Flush every write to disk before acknowledging it.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/ledger"),
            backend: StorageBackend::File,
            sync_writes: true,
        }
    }
}

/// Which block source feeds the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Newline-delimited JSON exporter dump.
    #[default]
    Export,
    /// Deterministically generated ledger.
    Synthetic,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "export" => Ok(SourceKind::Export),
            "synthetic" => Ok(SourceKind::Synthetic),
            other => Err(format!("unknown source {other:?}")),
        }
    }
}

/// Block source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Directory holding `blocks.json` and `transactions.json`.
    pub export_dir: PathBuf,
    /// Concurrent delivery workers per page.
    pub workers: usize,
    /// Seed for delivery order and synthetic data.
    pub seed: u64,
    /// Length of the synthetic ledger.
    pub synthetic_blocks: u64,
    /// Maximum transactions per synthetic block.
    pub synthetic_max_transactions: u32,
    /// Probability that a synthetic page fetch fails.
    pub failure_rate: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Export,
            export_dir: PathBuf::from("./export"),
            workers: 5,
            seed: 0,
            synthetic_blocks: 10_000,
            synthetic_max_transactions: 200,
            failure_rate: 0.0,
        }
    }
}

impl IngestConfig {
    /// Create config for testing (small pages, synthetic source, no fsync).
    pub fn for_testing(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig {
                data_dir: data_dir.into(),
                backend: StorageBackend::File,
                sync_writes: false,
            },
            sync: SyncConfig::for_testing(),
            source: SourceConfig {
                kind: SourceKind::Synthetic,
                workers: 2,
                seed: 7,
                synthetic_blocks: 50,
                synthetic_max_transactions: 4,
                ..SourceConfig::default()
            },
        }
    }

    /// Defaults overlaid with the file (if any) and the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from `LI_*` variables looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("LI_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("LI_BACKEND") {
            self.storage.backend = parse_env("LI_BACKEND", value)?;
        }
        if let Some(value) = lookup("LI_SYNC_WRITES") {
            self.storage.sync_writes = parse_env("LI_SYNC_WRITES", value)?;
        }
        if let Some(value) = lookup("LI_PAGE_SIZE") {
            self.sync.page_size = parse_env("LI_PAGE_SIZE", value)?;
        }
        if let Some(value) = lookup("LI_MAX_PAGE_ATTEMPTS") {
            self.sync.max_page_attempts = parse_env("LI_MAX_PAGE_ATTEMPTS", value)?;
        }
        if let Some(value) = lookup("LI_RETRY_BACKOFF_MS") {
            self.sync.retry_backoff_ms = parse_env("LI_RETRY_BACKOFF_MS", value)?;
        }
        if let Some(value) = lookup("LI_SOURCE") {
            self.source.kind = parse_env("LI_SOURCE", value)?;
        }
        if let Some(dir) = lookup("LI_EXPORT_DIR") {
            self.source.export_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("LI_WORKERS") {
            self.source.workers = parse_env("LI_WORKERS", value)?;
        }
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sync
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.source.workers == 0 {
            return Err(ConfigError::Invalid("source.workers must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.source.failure_rate) {
            return Err(ConfigError::Invalid(format!(
                "source.failure_rate {} is not a probability",
                self.source.failure_rate
            )));
        }
        if self.storage.backend == StorageBackend::RocksDb && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::Invalid(
                "storage.backend = rocksdb needs a build with the `rocksdb` feature".into(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
