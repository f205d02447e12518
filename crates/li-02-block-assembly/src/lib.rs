//! # Block Assembly (li-02)
//!
//! Turns an unordered stream of block and transaction events into strictly
//! ordered commits.
//!
//! ## Lifecycle
//!
//! ```text
//! Unseen -> Buffering -> Complete -> Committed -> Retired
//! ```
//!
//! A block is complete when its header arrived and exactly
//! `transaction_count` distinct transaction indices arrived. Block `k` is
//! committed only after every block below it; a block that completes early
//! waits in its slot.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Strict Order | Commits are exactly `next_block, next_block + 1, ...` |
//! | 2 | Bounded Buffer | Only `[next_block, next_block + window)` is buffered |
//! | 3 | Shape Check | A transaction index `>= transaction_count` fails fast |
//! | 4 | Cursor Per Commit | The cursor is persisted after every block, never batched |
//!
//! ## Crate Structure
//!
//! - `domain/` - configuration, the arena window, block states, errors
//! - `ports/` - `LedgerWriter`, the commit target
//! - `service.rs` - `ReassemblyEngine`

pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use domain::config::AssemblyConfig;
pub use domain::errors::AssemblyError;
pub use domain::state::{BlockState, IncompleteBlock};
pub use ports::outbound::LedgerWriter;
pub use service::ReassemblyEngine;
