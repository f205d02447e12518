//! # Structural Validation
//!
//! Checks applied to every stored block by `LedgerStore::validate`.

use crate::domain::errors::LedgerError;
use shared_types::BlockRecord;

/// Summary of a successful validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// First block visited.
    pub first_block: Option<u64>,
    /// Last block visited.
    pub last_block: Option<u64>,
    /// Number of blocks visited.
    pub blocks: u64,
    /// Number of transactions visited.
    pub transactions: u64,
}

impl ValidationReport {
    /// Next block number a follow-up pass should start from.
    pub fn next_block(&self) -> Option<u64> {
        self.last_block.map(|n| n + 1)
    }

    pub(crate) fn record(&mut self, block: &BlockRecord) {
        if self.first_block.is_none() {
            self.first_block = Some(block.number);
        }
        self.last_block = Some(block.number);
        self.blocks += 1;
        self.transactions += block.transactions.len() as u64;
    }
}

/// Check a stored block against its key-derived number and the expected
/// sequential counter, then its internal shape.
pub fn check_stored_block(
    key_number: u64,
    expected: u64,
    block: &BlockRecord,
) -> Result<(), LedgerError> {
    if key_number != expected {
        return Err(LedgerError::corrupt(
            expected,
            format!("gap in sequence: found key {key_number}"),
        ));
    }
    if block.number != key_number {
        return Err(LedgerError::corrupt(
            key_number,
            format!("record declares number {}", block.number),
        ));
    }
    check_block_shape(block)
}

/// Check that a block's transactions match its declared count and that
/// every transaction sits at its own index.
pub fn check_block_shape(block: &BlockRecord) -> Result<(), LedgerError> {
    if block.transactions.len() != block.transaction_count as usize {
        return Err(LedgerError::corrupt(
            block.number,
            format!(
                "declares {} transactions, holds {}",
                block.transaction_count,
                block.transactions.len()
            ),
        ));
    }
    for (position, tx) in block.transactions.iter().enumerate() {
        if tx.block_number != block.number {
            return Err(LedgerError::corrupt(
                block.number,
                format!(
                    "transaction {position} belongs to block {}",
                    tx.block_number
                ),
            ));
        }
        if tx.transaction_index as usize != position {
            return Err(LedgerError::corrupt(
                block.number,
                format!(
                    "transaction at position {position} has index {}",
                    tx.transaction_index
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_block;

    #[test]
    fn test_well_formed_block_passes() {
        let block = make_block(3, 4);
        assert!(check_stored_block(3, 3, &block).is_ok());
    }

    #[test]
    fn test_gap_is_reported_at_expected_number() {
        let block = make_block(5, 0);
        let err = check_stored_block(5, 4, &block).unwrap_err();
        assert!(matches!(err, LedgerError::CorruptLedger { number: 4, .. }));
    }

    #[test]
    fn test_number_mismatch_with_key() {
        let block = make_block(9, 0);
        let err = check_stored_block(8, 8, &block).unwrap_err();
        assert!(matches!(err, LedgerError::CorruptLedger { number: 8, .. }));
    }

    #[test]
    fn test_count_mismatch() {
        let mut block = make_block(2, 3);
        block.transactions.pop();
        let err = check_block_shape(&block).unwrap_err();
        assert!(err.to_string().contains("declares 3 transactions, holds 2"));
    }

    #[test]
    fn test_misplaced_transaction() {
        let mut block = make_block(2, 3);
        block.transactions.swap(0, 2);
        assert!(check_block_shape(&block).is_err());
    }

    #[test]
    fn test_foreign_transaction() {
        let mut block = make_block(2, 2);
        block.transactions[1].block_number = 3;
        let err = check_block_shape(&block).unwrap_err();
        assert!(err.to_string().contains("belongs to block 3"));
    }

    #[test]
    fn test_report_tracks_range() {
        let mut report = ValidationReport::default();
        report.record(&make_block(10, 2));
        report.record(&make_block(11, 1));
        assert_eq!(report.first_block, Some(10));
        assert_eq!(report.last_block, Some(11));
        assert_eq!(report.blocks, 2);
        assert_eq!(report.transactions, 3);
        assert_eq!(report.next_block(), Some(12));
    }
}
