//! # Read-Only Commands
//!
//! `validate` and `status` open their own read-only handle, so they can run
//! while a sync holds the writer lock.

use std::fmt;

use anyhow::{Context, Result};
use li_01_ledger_store::{LedgerStore, ValidationReport};
use tracing::info;

use crate::adapters::storage::{open_store, OpenMode};
use crate::container::config::StorageConfig;

/// Cursor and extent of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus {
    /// Explicit cursor record.
    pub cursor: Option<u64>,
    /// Highest stored block.
    pub highest_block: Option<u64>,
    /// Where the next sync starts.
    pub resume_point: u64,
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<u64>| v.map_or_else(|| "none".to_string(), |n| n.to_string());
        write!(
            f,
            "cursor: {}\nhighest block: {}\nresume point: {}",
            show(self.cursor),
            show(self.highest_block),
            self.resume_point
        )
    }
}

/// Walk the store from `from_block` and check it is gap-free and well formed.
pub fn validate(config: &StorageConfig, from_block: u64) -> Result<ValidationReport> {
    let store = open_store(config, OpenMode::ReadOnly)
        .with_context(|| format!("opening {:?} read-only", config.data_dir))?;
    let ledger = LedgerStore::new(store);

    info!("[li-rt] Validating {:?} from block {}", config.data_dir, from_block);
    let report = ledger
        .validate_from(from_block)
        .context("ledger validation failed")?;
    info!(
        "[li-rt] Ledger valid: {} blocks, {} transactions",
        report.blocks, report.transactions
    );
    Ok(report)
}

/// Report the cursor and the highest stored block.
pub fn status(config: &StorageConfig) -> Result<StoreStatus> {
    let store = open_store(config, OpenMode::ReadOnly)
        .with_context(|| format!("opening {:?} read-only", config.data_dir))?;
    let ledger = LedgerStore::new(store);

    Ok(StoreStatus {
        cursor: ledger.cursor()?,
        highest_block: ledger.ceiling_entry()?.map(|(number, _)| number),
        resume_point: ledger.resume_point()?,
    })
}
