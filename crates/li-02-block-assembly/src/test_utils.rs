//! Writers for exercising the engine without a store.

use li_01_ledger_store::LedgerError;
use shared_types::BlockRecord;

use crate::ports::outbound::LedgerWriter;

/// Records every call in order.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub blocks: Vec<BlockRecord>,
    pub cursors: Vec<u64>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Numbers of committed blocks, in commit order.
    pub fn committed_numbers(&self) -> Vec<u64> {
        self.blocks.iter().map(|b| b.number).collect()
    }
}

impl LedgerWriter for RecordingWriter {
    fn put_block(&mut self, block: &BlockRecord) -> Result<(), LedgerError> {
        self.blocks.push(block.clone());
        Ok(())
    }

    fn store_cursor(&mut self, next_block: u64) -> Result<(), LedgerError> {
        self.cursors.push(next_block);
        Ok(())
    }
}

/// Wraps a writer and fails the cursor write that would move the cursor
/// past `crash_after`: the block is written, the cursor is not.
#[derive(Debug)]
pub struct CrashingWriter<W> {
    pub inner: W,
    pub crash_after: u64,
}

impl<W: LedgerWriter> CrashingWriter<W> {
    pub fn new(inner: W, crash_after: u64) -> Self {
        Self { inner, crash_after }
    }
}

impl<W: LedgerWriter> LedgerWriter for CrashingWriter<W> {
    fn put_block(&mut self, block: &BlockRecord) -> Result<(), LedgerError> {
        self.inner.put_block(block)
    }

    fn store_cursor(&mut self, next_block: u64) -> Result<(), LedgerError> {
        if next_block > self.crash_after {
            return Err(LedgerError::Store(
                li_01_ledger_store::KVStoreError::IOError {
                    message: format!("simulated crash before cursor {next_block}"),
                },
            ));
        }
        self.inner.store_cursor(next_block)
    }
}
