//! # Shared Types Crate
//!
//! Ledger records and the inbound event type shared by every subsystem of the
//! ingest pipeline.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `BlockRecord` and `TransactionRecord` are
//!   defined once here and flow unchanged from the fetch layer to the store.
//! - **Typed Events**: producers never touch the pending buffer; they emit
//!   `LedgerEvent`s that a single consumer applies.

pub mod encoding;
pub mod entities;
pub mod events;

pub use encoding::{decode_address, decode_hash, decode_hex_bytes, HexDecodeError};
pub use entities::*;
pub use events::LedgerEvent;
