//! # Outbound Ports (Driven Ports)
//!
//! The commit target of the reassembly engine.

use li_01_ledger_store::{KeyValueStore, LedgerError, LedgerStore};
use shared_types::BlockRecord;

/// Where completed blocks go.
///
/// The engine calls `put_block` then `store_cursor(number + 1)` for every
/// block, in that order. A crash between the two leaves a block that is
/// written but not covered by the cursor; `put_block` must therefore be
/// idempotent.
pub trait LedgerWriter {
    /// Durably write a complete block.
    fn put_block(&mut self, block: &BlockRecord) -> Result<(), LedgerError>;

    /// Persist the lowest block number not yet committed.
    fn store_cursor(&mut self, next_block: u64) -> Result<(), LedgerError>;
}

impl<S: KeyValueStore> LedgerWriter for LedgerStore<S> {
    fn put_block(&mut self, block: &BlockRecord) -> Result<(), LedgerError> {
        self.put(block)
    }

    fn store_cursor(&mut self, next_block: u64) -> Result<(), LedgerError> {
        LedgerStore::store_cursor(self, next_block)
    }
}

impl<W: LedgerWriter + ?Sized> LedgerWriter for &mut W {
    fn put_block(&mut self, block: &BlockRecord) -> Result<(), LedgerError> {
        (**self).put_block(block)
    }

    fn store_cursor(&mut self, next_block: u64) -> Result<(), LedgerError> {
        (**self).store_cursor(next_block)
    }
}
