//! # Instrumented Store
//!
//! `RecordingStore` wraps a key-value store, logs every written key and can
//! simulate a crash between a block write and its cursor write.

use std::sync::Arc;

use li_01_ledger_store::{
    decode_block_key, BatchOperation, KVStoreError, KeyValueStore, KvIter, KvPair, CURSOR_KEY,
};
use parking_lot::Mutex;

/// Shared log of written keys, in write order.
pub type WriteLog = Arc<Mutex<Vec<Vec<u8>>>>;

pub struct RecordingStore<S> {
    inner: S,
    log: WriteLog,
    crash_after: Option<u64>,
}

impl<S: KeyValueStore> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            log: WriteLog::default(),
            crash_after: None,
        }
    }

    /// Reject any cursor write that would move the cursor past `block`.
    pub fn crash_after(mut self, block: u64) -> Self {
        self.crash_after = Some(block);
        self
    }

    pub fn log(&self) -> WriteLog {
        Arc::clone(&self.log)
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn record(&self, key: &[u8], value: Option<&[u8]>) -> Result<(), KVStoreError> {
        if let (Some(limit), Some(value)) = (self.crash_after, value) {
            if key == CURSOR_KEY {
                let raw: [u8; 8] = value.try_into().map_err(KVStoreError::io)?;
                let next = u64::from_be_bytes(raw);
                if next > limit {
                    return Err(KVStoreError::io(format!("power lost before cursor {next}")));
                }
            }
        }
        self.log.lock().push(key.to_vec());
        Ok(())
    }
}

impl<S: KeyValueStore> KeyValueStore for RecordingStore<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.record(key, Some(value))?;
        self.inner.put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.record(key, None)?;
        self.inner.delete(key)
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        for op in &operations {
            match op {
                BatchOperation::Put { key, value } => self.record(key, Some(value))?,
                BatchOperation::Delete { key } => self.record(key, None)?,
            }
        }
        self.inner.atomic_batch_write(operations)
    }

    fn iter_from<'a>(&'a self, start: &[u8]) -> Result<KvIter<'a>, KVStoreError> {
        self.inner.iter_from(start)
    }

    fn last_entry(&self) -> Result<Option<KvPair>, KVStoreError> {
        self.inner.last_entry()
    }
}

/// Block numbers written, in write order.
pub fn block_writes(log: &WriteLog) -> Vec<u64> {
    log.lock()
        .iter()
        .filter_map(|key| decode_block_key(key).ok())
        .collect()
}

/// Number of cursor writes.
pub fn cursor_writes(log: &WriteLog) -> usize {
    log.lock()
        .iter()
        .filter(|key| key.as_slice() == CURSOR_KEY)
        .count()
}

/// Every entry in the store.
pub fn snapshot<S: KeyValueStore>(store: &S) -> Vec<KvPair> {
    store
        .iter_from(b"")
        .and_then(|iter| iter.collect())
        .unwrap_or_default()
}
