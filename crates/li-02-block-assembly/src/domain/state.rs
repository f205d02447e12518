//! Per-block lifecycle states.

use std::fmt;

/// Where a block number stands in the pipeline. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Nothing has arrived.
    Unseen,
    /// Some records arrived; the block is not complete yet.
    Buffering,
    /// Header and every transaction present; waiting for lower blocks.
    Complete,
    /// Written to the ledger; cursor not yet advanced past it.
    Committed,
    /// Cursor is past it and its buffer slot is free.
    Retired,
}

/// Snapshot of the lowest block that has not been retired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteBlock {
    pub number: u64,
    /// Declared transaction count, known once the header arrived.
    pub expected_transactions: Option<u32>,
    pub received_transactions: usize,
}

impl fmt::Display for IncompleteBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected_transactions {
            None => write!(
                f,
                "block {} has no header ({} transactions buffered)",
                self.number, self.received_transactions
            ),
            Some(expected) => write!(
                f,
                "block {} has {} of {} transactions",
                self.number, self.received_transactions, expected
            ),
        }
    }
}
