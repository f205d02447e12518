//! # Resume/Recovery Driver
//!
//! Nothing buffered survives a restart. The driver reads the persisted
//! cursor, checks it against the highest stored block, and starts the
//! scheduler from there.

use std::sync::Arc;

use li_01_ledger_store::{KeyValueStore, LedgerError, LedgerStore};
use li_02_block_assembly::{AssemblyConfig, ReassemblyEngine};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::application::scheduler::PageScheduler;
use crate::config::SyncConfig;
use crate::domain::errors::SyncError;
use crate::domain::outcome::SyncOutcome;
use crate::ports::outbound::BlockSource;

/// Where a run starts and what the store looked like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePlan {
    /// First block to commit.
    pub next_block: u64,
    /// One past the highest stored block (0 for an empty store).
    pub stored_through: u64,
    /// The explicit cursor record, if present.
    pub cursor: Option<u64>,
}

impl ResumePlan {
    /// Blocks stored past the cursor by a run that crashed between a block
    /// write and its cursor write. They are re-committed idempotently.
    pub fn replay_range(&self) -> Option<std::ops::Range<u64>> {
        (self.next_block < self.stored_through).then_some(self.next_block..self.stored_through)
    }
}

/// Work out the resume point of a store.
///
/// Explicit cursor, else one past the highest stored block, else 0. A
/// cursor ahead of the stored blocks claims commits that never happened.
pub fn plan_resume<S: KeyValueStore>(store: &LedgerStore<S>) -> Result<ResumePlan, SyncError> {
    let stored_through = store
        .ceiling_entry()?
        .map(|(number, _)| number + 1)
        .unwrap_or(0);
    let cursor = store.cursor()?;

    let next_block = match cursor {
        Some(cursor) if cursor > stored_through => {
            return Err(LedgerError::corrupt(
                stored_through,
                format!("cursor {cursor} points past an uncommitted block"),
            )
            .into());
        }
        Some(cursor) => cursor,
        None => stored_through,
    };

    Ok(ResumePlan {
        next_block,
        stored_through,
        cursor,
    })
}

/// Starts (or restarts) a sync run against a store.
pub struct RecoveryDriver<S: BlockSource + ?Sized + 'static> {
    source: Arc<S>,
    config: SyncConfig,
    shutdown: watch::Receiver<bool>,
}

impl<S: BlockSource + ?Sized + 'static> RecoveryDriver<S> {
    pub fn new(source: Arc<S>, config: SyncConfig, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            source,
            config,
            shutdown,
        }
    }

    /// Sync the store through `last_block` (inclusive).
    ///
    /// Restartable with the same arguments after a crash or cancellation.
    pub async fn run<K: KeyValueStore>(
        &self,
        store: &mut LedgerStore<K>,
        last_block: u64,
    ) -> Result<SyncOutcome, SyncError> {
        self.config.validate()?;
        let plan = plan_resume(store)?;

        if let Some(replay) = plan.replay_range() {
            warn!(
                "[li-03] Cursor {} is behind stored block {}; re-committing blocks {:?}",
                plan.next_block,
                plan.stored_through - 1,
                replay
            );
        }

        if plan.next_block > last_block {
            info!(
                "[li-03] Store already holds blocks through {}, nothing to do",
                plan.next_block.saturating_sub(1)
            );
            return Ok(SyncOutcome::UpToDate {
                next_block: plan.next_block,
            });
        }

        info!(
            "[li-03] Resuming from block {} towards {} via {} (page size {})",
            plan.next_block,
            last_block,
            self.source.name(),
            self.config.page_size
        );

        let mut engine = ReassemblyEngine::new(
            &mut *store,
            AssemblyConfig::with_window(self.config.page_size),
            plan.next_block,
        )?;
        let mut scheduler = PageScheduler::new(
            Arc::clone(&self.source),
            self.config.clone(),
            self.shutdown.clone(),
        )?;

        let outcome = scheduler.run(&mut engine, last_block).await?;
        info!(
            "[li-03] Sync stopped: {} blocks committed, cursor at {}",
            outcome.committed(),
            outcome.next_block()
        );
        Ok(outcome)
    }
}
