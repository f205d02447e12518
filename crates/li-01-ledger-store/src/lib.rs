//! # Ledger Store (li-01)
//!
//! The persistence layer of the ingest pipeline: a typed facade over an
//! ordered, byte-lexicographic key-value store.
//!
//! ## Persisted Layout
//!
//! ```text
//! #next_block          -> cursor (u64, big-endian)      [metadata namespace]
//! 000000000            -> crc32 || bincode(BlockRecord)  [block namespace]
//! 000000001            -> ...
//! ...
//! ```
//!
//! Metadata keys start with `#` (0x23), which sorts below every ASCII digit,
//! so the highest key in the store is always the highest committed block.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Order Preservation | `a < b` implies `key(a) < key(b)` |
//! | 2 | Idempotent Put | Re-writing a block overwrites it byte-for-byte |
//! | 3 | Data Integrity | Checksum verified on every read |
//! | 4 | Cursor Monotonicity | The persisted cursor never regresses |
//! | 5 | Gap-Free Sequence | `validate()` rejects gaps, duplicates, shape errors |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - key codec, errors, block shape validation
//! - `ports/` - the `KeyValueStore` driven port and its in-memory adapter
//! - `adapters/` - file-backed store, directory lock, value serializer
//! - `service.rs` - `LedgerStore`, the typed facade

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export key types for convenience
pub use adapters::file_store::FileBackedKVStore;
pub use domain::errors::{KVStoreError, LedgerError};
pub use domain::keys::{
    decode_block_key, encode_block_key, BlockKey, BLOCK_KEY_WIDTH, CURSOR_KEY, MAX_BLOCK_NUMBER,
};
pub use domain::validation::ValidationReport;
pub use ports::outbound::{BatchOperation, InMemoryKVStore, KeyValueStore, KvIter, KvPair};
pub use service::{BlockRange, LedgerStore};
