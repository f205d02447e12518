//! # Ledger Events
//!
//! Typed events enqueued by the fetch layer. The reassembly engine is the
//! only consumer.

use crate::entities::{BlockNumber, BlockRecord, TransactionRecord};

/// A record delivered by the fetch layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    /// A block record arrived.
    Block(BlockRecord),
    /// A transaction record arrived.
    Transaction(TransactionRecord),
}

impl LedgerEvent {
    /// Block number this event belongs to.
    pub fn block_number(&self) -> BlockNumber {
        match self {
            LedgerEvent::Block(block) => block.number,
            LedgerEvent::Transaction(tx) => tx.block_number,
        }
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::Block(_) => "block",
            LedgerEvent::Transaction(_) => "transaction",
        }
    }
}

impl From<BlockRecord> for LedgerEvent {
    fn from(block: BlockRecord) -> Self {
        LedgerEvent::Block(block)
    }
}

impl From<TransactionRecord> for LedgerEvent {
    fn from(tx: TransactionRecord) -> Self {
        LedgerEvent::Transaction(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_block_number() {
        let block: LedgerEvent = BlockRecord::header(5, [0; 32], 1).into();
        let tx: LedgerEvent = TransactionRecord::new(6, 0, [0; 32]).into();
        assert_eq!(block.block_number(), 5);
        assert_eq!(tx.block_number(), 6);
        assert_eq!(block.kind(), "block");
        assert_eq!(tx.kind(), "transaction");
    }
}
