//! Sync run outcomes.

/// How a sync run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Every block through the target was committed.
    Completed { next_block: u64, committed: u64 },
    /// Shutdown was requested; partial page state was discarded.
    Cancelled { next_block: u64, committed: u64 },
    /// The store already covered the target. Nothing was fetched.
    UpToDate { next_block: u64 },
}

impl SyncOutcome {
    /// The persisted cursor at the end of the run.
    pub fn next_block(&self) -> u64 {
        match *self {
            SyncOutcome::Completed { next_block, .. }
            | SyncOutcome::Cancelled { next_block, .. }
            | SyncOutcome::UpToDate { next_block } => next_block,
        }
    }

    /// Blocks committed during the run.
    pub fn committed(&self) -> u64 {
        match *self {
            SyncOutcome::Completed { committed, .. } | SyncOutcome::Cancelled { committed, .. } => {
                committed
            }
            SyncOutcome::UpToDate { .. } => 0,
        }
    }
}
