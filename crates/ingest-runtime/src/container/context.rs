//! # Pipeline Context
//!
//! Built once at startup: configuration, the writable store handle, the
//! block source and the shutdown receiver. Dropping it closes the store and
//! releases the directory lock on every exit path.

use std::sync::Arc;

use anyhow::{Context, Result};
use li_01_ledger_store::{KeyValueStore, LedgerStore};
use li_03_page_sync::{BlockSource, RecoveryDriver, SyncError, SyncOutcome};
use tokio::sync::watch;
use tracing::info;

use crate::adapters::sources::build_source;
use crate::adapters::storage::{open_store, OpenMode};
use crate::container::config::IngestConfig;

pub struct PipelineContext {
    pub config: IngestConfig,
    pub store: LedgerStore<Box<dyn KeyValueStore>>,
    pub source: Arc<dyn BlockSource>,
    pub shutdown: watch::Receiver<bool>,
}

impl PipelineContext {
    /// Validate the config, build the source and open the store for writing.
    pub fn build(config: IngestConfig, shutdown: watch::Receiver<bool>) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        let source = build_source(&config.source).context("building block source")?;
        let store = open_store(&config.storage, OpenMode::ReadWrite).with_context(|| {
            format!("opening store at {:?}", config.storage.data_dir)
        })?;
        info!(
            "[li-rt] Pipeline ready: store {:?} ({:?}), source {}",
            config.storage.data_dir,
            config.storage.backend,
            source.name()
        );
        Ok(Self::from_parts(config, store, source, shutdown))
    }

    /// Assemble a context from already opened parts.
    pub fn from_parts(
        config: IngestConfig,
        store: Box<dyn KeyValueStore>,
        source: Arc<dyn BlockSource>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            store: LedgerStore::new(store),
            source,
            shutdown,
        }
    }

    /// Sync through `to_block`, or through the source's latest block.
    pub async fn sync(&mut self, to_block: Option<u64>) -> Result<SyncOutcome> {
        let last_block = match to_block {
            Some(block) => block,
            None => self
                .source
                .latest_block()
                .await
                .map_err(SyncError::Source)?
                .context("source has no blocks and no --to-block was given")?,
        };

        let driver = RecoveryDriver::new(
            Arc::clone(&self.source),
            self.config.sync.clone(),
            self.shutdown.clone(),
        );
        let outcome = driver.run(&mut self.store, last_block).await?;
        Ok(outcome)
    }
}
