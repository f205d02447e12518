//! # Ledger Entities
//!
//! The block and transaction records ingested from the remote ledger.
//!
//! A block is *complete* when it carries exactly `transaction_count`
//! transactions, placed at their `transaction_index`.

use serde::{Deserialize, Serialize};

// Re-export U256 for transaction values
pub use primitive_types::U256;

/// A 32-byte block or transaction hash.
pub type Hash = [u8; 32];

/// A 20-byte account address.
pub type Address = [u8; 20];

/// Position of a block in the ledger.
pub type BlockNumber = u64;

/// A block of the ledger.
///
/// Arrives from the fetch layer as a header (empty `transactions`) and is
/// stored fully assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockRecord {
    /// Block number (unique, gap-free in the committed sequence).
    pub number: BlockNumber,
    /// Block hash.
    pub hash: Hash,
    /// Hash of the previous block.
    pub parent_hash: Hash,
    /// Unix timestamp of the block.
    pub timestamp: u64,
    /// Address credited with the block reward.
    pub miner: Address,
    /// Gas consumed by all transactions.
    pub gas_used: u64,
    /// Gas limit of the block.
    pub gas_limit: u64,
    /// Declared number of transactions.
    pub transaction_count: u32,
    /// Transactions ordered by `transaction_index`.
    pub transactions: Vec<TransactionRecord>,
}

impl BlockRecord {
    /// Create a header-only record.
    pub fn header(number: BlockNumber, hash: Hash, transaction_count: u32) -> Self {
        Self {
            number,
            hash,
            transaction_count,
            ..Default::default()
        }
    }

    /// True if no transactions are attached yet.
    pub fn is_header_only(&self) -> bool {
        self.transactions.is_empty()
    }

    /// True if the attached transactions match the declared count.
    pub fn is_complete(&self) -> bool {
        self.transactions.len() == self.transaction_count as usize
    }
}

/// A transaction, identified by `(block_number, transaction_index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TransactionRecord {
    /// Transaction hash.
    pub hash: Hash,
    /// Number of the containing block.
    pub block_number: BlockNumber,
    /// Position within the block, in `[0, transaction_count)`.
    pub transaction_index: u32,
    /// Sender.
    pub from: Address,
    /// Recipient (`None` for contract creation).
    pub to: Option<Address>,
    /// Transferred value in base units.
    pub value: U256,
    /// Gas limit supplied by the sender.
    pub gas: u64,
    /// Call data.
    pub input: Vec<u8>,
}

impl TransactionRecord {
    /// Create a transaction with only its identity fields set.
    pub fn new(block_number: BlockNumber, transaction_index: u32, hash: Hash) -> Self {
        Self {
            hash,
            block_number,
            transaction_index,
            ..Default::default()
        }
    }
}
