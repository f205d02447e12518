//! # Command Line
//!
//! Flags override the config file and the `LI_*` environment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::container::config::{ConfigError, IngestConfig, SourceKind, StorageBackend};

/// Resumable, ordered block ledger ingestion.
#[derive(Debug, Parser)]
#[command(name = "ledger-ingest", version)]
pub struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store directory.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Store backend (`file` or `rocksdb`).
    #[arg(long, global = true)]
    pub backend: Option<StorageBackend>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest blocks from the source, resuming where the store left off.
    Sync(SyncArgs),
    /// Check the stored ledger is gap-free and well formed.
    Validate {
        /// First block to check.
        #[arg(long, default_value_t = 0)]
        from_block: u64,
    },
    /// Print the cursor and the highest stored block.
    Status,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Last block to ingest (inclusive). Defaults to the source's latest.
    #[arg(long)]
    pub to_block: Option<u64>,

    /// Blocks per page.
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Attempts per page before giving up.
    #[arg(long)]
    pub max_page_attempts: Option<u32>,

    /// Block source (`export` or `synthetic`).
    #[arg(long)]
    pub source: Option<SourceKind>,

    /// Exporter dump directory.
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Concurrent delivery workers per page.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Delivery order and synthetic data seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Load the layered configuration and apply this invocation's flags.
    pub fn resolve_config(&self) -> Result<IngestConfig, ConfigError> {
        let mut config = IngestConfig::load(self.config.as_deref())?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut IngestConfig) {
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir = dir.clone();
        }
        if let Some(backend) = self.backend {
            config.storage.backend = backend;
        }
        if let Command::Sync(args) = &self.command {
            if let Some(page_size) = args.page_size {
                config.sync.page_size = page_size;
            }
            if let Some(attempts) = args.max_page_attempts {
                config.sync.max_page_attempts = attempts;
            }
            if let Some(kind) = args.source {
                config.source.kind = kind;
            }
            if let Some(dir) = &args.export_dir {
                config.source.export_dir = dir.clone();
            }
            if let Some(workers) = args.workers {
                config.source.workers = workers;
            }
            if let Some(seed) = args.seed {
                config.source.seed = seed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ledger-ingest").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_sync_flags_override_config() {
        let cli = parse(&[
            "sync",
            "--to-block",
            "99",
            "--page-size",
            "25",
            "--source",
            "synthetic",
            "--workers",
            "3",
            "--data-dir",
            "/tmp/ledger",
        ]);
        let mut config = IngestConfig::default();
        cli.apply(&mut config);

        assert!(matches!(&cli.command, Command::Sync(args) if args.to_block == Some(99)));
        assert_eq!(config.sync.page_size, 25);
        assert_eq!(config.source.kind, SourceKind::Synthetic);
        assert_eq!(config.source.workers, 3);
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/ledger"));
    }

    #[test]
    fn test_validate_defaults_to_genesis() {
        let cli = parse(&["validate"]);
        assert!(matches!(cli.command, Command::Validate { from_block: 0 }));
    }

    #[test]
    fn test_global_backend_flag() {
        let cli = parse(&["status", "--backend", "rocksdb"]);
        assert_eq!(cli.backend, Some(StorageBackend::RocksDb));
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let result = Cli::try_parse_from(["ledger-ingest", "sync", "--source", "carrier-pigeon"]);
        assert!(result.is_err());
    }
}
