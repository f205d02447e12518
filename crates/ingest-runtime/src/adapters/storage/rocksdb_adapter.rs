//! # RocksDB Storage Adapter
//!
//! RocksDB implementation of `KeyValueStore`. Uses the default column
//! family with the bytewise comparator, so key order matches the in-memory
//! and file-backed stores.
//!
//! - Snappy compression
//! - Bloom filters for point reads
//! - Optional fsync on every write
//! - Read-only handles via `DB::open_for_read_only`

use std::path::PathBuf;

use li_01_ledger_store::{BatchOperation, KVStoreError, KeyValueStore, KvIter, KvPair};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};

/// RocksDB configuration.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: PathBuf,
    /// Block cache size in bytes (default: 256MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 64MB)
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3)
    pub max_write_buffer_number: i32,
    /// Enable fsync after each write
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/ledger"),
            block_cache_size: 256 * 1024 * 1024, // 256MB
            write_buffer_size: 64 * 1024 * 1024, // 64MB
            max_write_buffer_number: 3,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,  // 8MB
            write_buffer_size: 4 * 1024 * 1024, // 4MB
            max_write_buffer_number: 2,
            sync_writes: false,
        }
    }

    fn options(&self) -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts.set_max_write_buffer_number(self.max_write_buffer_number);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(self.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);
        opts
    }
}

/// RocksDB-backed ordered key-value store.
pub struct RocksDbStore {
    db: DB,
    config: RocksDbConfig,
    read_only: bool,
}

impl RocksDbStore {
    /// Open or create a writable database. RocksDB's own LOCK file keeps
    /// a second writer out.
    pub fn open(config: RocksDbConfig) -> Result<Self, KVStoreError> {
        let db = DB::open(&config.options(), &config.path).map_err(|e| KVStoreError::IOError {
            message: format!("Failed to open RocksDB at {:?}: {}", config.path, e),
        })?;
        Ok(Self {
            db,
            config,
            read_only: false,
        })
    }

    /// Open an existing database read-only.
    pub fn open_read_only(config: RocksDbConfig) -> Result<Self, KVStoreError> {
        let mut opts = config.options();
        opts.create_if_missing(false);
        let db = DB::open_for_read_only(&opts, &config.path, false).map_err(|e| {
            KVStoreError::IOError {
                message: format!("Failed to open RocksDB read-only at {:?}: {}", config.path, e),
            }
        })?;
        Ok(Self {
            db,
            config,
            read_only: true,
        })
    }

    fn write_options(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }

    fn check_writable(&self) -> Result<(), KVStoreError> {
        if self.read_only {
            return Err(KVStoreError::ReadOnly);
        }
        Ok(())
    }
}

fn rocks_error(op: &str, e: rocksdb::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: format!("RocksDB {op} failed: {e}"),
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.get(key).map_err(|e| rocks_error("get", e))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.check_writable()?;
        self.db
            .put_opt(key, value, &self.write_options())
            .map_err(|e| rocks_error("put", e))
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.check_writable()?;
        self.db
            .delete_opt(key, &self.write_options())
            .map_err(|e| rocks_error("delete", e))
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        self.check_writable()?;
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }
        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| rocks_error("batch write", e))
    }

    fn iter_from<'a>(&'a self, start: &[u8]) -> Result<KvIter<'a>, KVStoreError> {
        let iter = self
            .db
            .iterator(IteratorMode::From(start, Direction::Forward))
            .map(|item| {
                item.map(|(k, v)| (k.into_vec(), v.into_vec()))
                    .map_err(|e| rocks_error("iterate", e))
            });
        Ok(Box::new(iter))
    }

    fn last_entry(&self) -> Result<Option<KvPair>, KVStoreError> {
        match self.db.iterator(IteratorMode::End).next() {
            Some(Ok((k, v))) => Ok(Some((k.into_vec(), v.into_vec()))),
            Some(Err(e)) => Err(rocks_error("seek to last", e)),
            None => Ok(None),
        }
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}
