//! # Outbound Ports (Driven Ports)
//!
//! The ordered key-value store the Ledger Store is built on.
//!
//! Production: `FileBackedKVStore` (adapters/file_store.rs) or `RocksDbStore`
//! (ingest-runtime/adapters/storage/rocksdb_adapter.rs).
//! Testing: `InMemoryKVStore` (below).

use crate::domain::errors::KVStoreError;
use std::collections::BTreeMap;

/// An owned key/value pair.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Lazy, ascending iterator over store entries.
pub type KvIter<'a> = Box<dyn Iterator<Item = Result<KvPair, KVStoreError>> + 'a>;

/// Abstract interface for an ordered key-value database.
///
/// All ordering is byte-lexicographic on keys.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Put a single key-value pair, overwriting any previous value.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    /// Delete a key. Deleting an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError>;

    /// Apply every operation or none of them.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Iterate entries with key `>= start`, ascending.
    fn iter_from<'a>(&'a self, start: &[u8]) -> Result<KvIter<'a>, KVStoreError>;

    /// The entry with the greatest key.
    fn last_entry(&self) -> Result<Option<KvPair>, KVStoreError>;

    /// True if this handle rejects writes.
    fn is_read_only(&self) -> bool {
        false
    }
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }

    /// Apply to an in-memory map.
    pub fn apply_to(self, data: &mut BTreeMap<Vec<u8>, Vec<u8>>) {
        match self {
            BatchOperation::Put { key, value } => {
                data.insert(key, value);
            }
            BatchOperation::Delete { key } => {
                data.remove(&key);
            }
        }
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        (**self).put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        (**self).delete(key)
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        (**self).atomic_batch_write(operations)
    }

    fn iter_from<'a>(&'a self, start: &[u8]) -> Result<KvIter<'a>, KVStoreError> {
        (**self).iter_from(start)
    }

    fn last_entry(&self) -> Result<Option<KvPair>, KVStoreError> {
        (**self).last_entry()
    }

    fn is_read_only(&self) -> bool {
        (**self).is_read_only()
    }
}

// =============================================================================
// ADAPTER IMPLEMENTATIONS
// Testing: In-memory implementation below
// =============================================================================

/// In-memory ordered key-value store for unit tests.
#[derive(Default, Clone)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.data.remove(key);
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        // Nothing can fail halfway in memory
        for op in operations {
            op.apply_to(&mut self.data);
        }
        Ok(())
    }

    fn iter_from<'a>(&'a self, start: &[u8]) -> Result<KvIter<'a>, KVStoreError> {
        let iter = self
            .data
            .range(start.to_vec()..)
            .map(|(k, v)| Ok((k.clone(), v.clone())));
        Ok(Box::new(iter))
    }

    fn last_entry(&self) -> Result<Option<KvPair>, KVStoreError> {
        Ok(self
            .data
            .iter()
            .next_back()
            .map(|(k, v)| (k.clone(), v.clone())))
    }
}
