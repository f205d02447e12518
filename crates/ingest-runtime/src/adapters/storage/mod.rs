//! # Storage Adapters
//!
//! Opens the configured backend behind `Box<dyn KeyValueStore>`.
//!
//! Enable the `rocksdb` feature for the RocksDB backend:
//!
//! ```toml
//! ingest-runtime = { path = "...", features = ["rocksdb"] }
//! ```

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbStore};

use li_01_ledger_store::{FileBackedKVStore, KVStoreError, KeyValueStore};

use crate::container::config::{StorageBackend, StorageConfig};

/// Writable or read-only handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Single writer; takes the directory lock.
    ReadWrite,
    /// Snapshot reader; may run alongside a writer.
    ReadOnly,
}

/// Open the configured backend.
pub fn open_store(
    config: &StorageConfig,
    mode: OpenMode,
) -> Result<Box<dyn KeyValueStore>, KVStoreError> {
    match config.backend {
        StorageBackend::File => {
            let store = match mode {
                OpenMode::ReadWrite => {
                    FileBackedKVStore::open(&config.data_dir, config.sync_writes)?
                }
                OpenMode::ReadOnly => FileBackedKVStore::open_read_only(&config.data_dir)?,
            };
            Ok(Box::new(store))
        }
        #[cfg(feature = "rocksdb")]
        StorageBackend::RocksDb => {
            let rocks_config = RocksDbConfig {
                path: config.data_dir.clone(),
                sync_writes: config.sync_writes,
                ..RocksDbConfig::default()
            };
            let store = match mode {
                OpenMode::ReadWrite => RocksDbStore::open(rocks_config)?,
                OpenMode::ReadOnly => RocksDbStore::open_read_only(rocks_config)?,
            };
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::RocksDb => Err(KVStoreError::IOError {
            message: "this build has no RocksDB support (enable the `rocksdb` feature)".into(),
        }),
    }
}
