//! # Adapters
//!
//! - `serializer` - checksummed bincode encoding of stored blocks
//! - `file_store` - append-only log store, the default backend
//! - `lock` - exclusive writer lock on a data directory

pub mod file_store;
#[cfg(feature = "locking")]
pub mod lock;
pub mod serializer;
