//! Block builders shared by unit and integration tests.

use shared_types::{BlockRecord, TransactionRecord};

/// Deterministic hash derived from a block number and a salt.
pub fn test_hash(number: u64, salt: u8) -> [u8; 32] {
    let mut hash = [salt; 32];
    hash[..8].copy_from_slice(&number.to_be_bytes());
    hash
}

/// A transaction at `(block, index)`.
pub fn make_transaction(block: u64, index: u32) -> TransactionRecord {
    let mut tx = TransactionRecord::new(block, index, test_hash(block, index as u8));
    tx.from = [0x11; 20];
    tx.to = Some([0x22; 20]);
    tx.gas = 21_000;
    tx
}

/// A header-only block declaring `tx_count` transactions.
pub fn make_header(number: u64, tx_count: u32) -> BlockRecord {
    let mut block = BlockRecord::header(number, test_hash(number, 0xB0), tx_count);
    block.parent_hash = test_hash(number.wrapping_sub(1), 0xB0);
    block.timestamp = 1_438_269_988 + number * 15;
    block
}

/// A fully assembled block with `tx_count` transactions.
pub fn make_block(number: u64, tx_count: u32) -> BlockRecord {
    let mut block = make_header(number, tx_count);
    block.transactions = (0..tx_count).map(|i| make_transaction(number, i)).collect();
    block
}
