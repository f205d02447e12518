//! # File-Backed Store
//!
//! Ordered key-value store persisted as an append-only record log and
//! replayed into a `BTreeMap` on open. Durable without a native storage
//! engine; the default backend of the runtime.
//!
//! ## Record Format
//!
//! ```text
//! record = [crc32: u32 LE][body_len: u32 LE][body]
//! body   = op*
//! op     = [tag: u8][key_len: u32 LE][value_len: u32 LE][key][value]
//! ```
//!
//! Tag 0 is a put, tag 1 a delete (empty value). A single put is a
//! one-op record; an atomic batch is one record holding every op. The
//! checksum covers the body. Replay stops at the first short or corrupt
//! record: that is a torn tail from a crash mid-append, and a read-write
//! open truncates it away.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

#[cfg(feature = "locking")]
use super::lock::WriterLock;
use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, KvIter, KvPair};

const RECORD_HEADER_LEN: usize = 8;
const OP_HEADER_LEN: usize = 9;
const TAG_PUT: u8 = 0;
const TAG_DELETE: u8 = 1;

/// Append-only log store.
pub struct FileBackedKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Log handle; `None` for read-only handles.
    log: Option<File>,
    path: PathBuf,
    sync_writes: bool,
    #[cfg(feature = "locking")]
    _lock: Option<WriterLock>,
}

impl FileBackedKVStore {
    /// Log file name inside the data directory.
    pub const LOG_FILE: &'static str = "ledger.log";

    /// Open (or create) a writable store in `data_dir`.
    ///
    /// Takes the directory's writer lock for the lifetime of the handle.
    pub fn open(data_dir: impl AsRef<Path>, sync_writes: bool) -> Result<Self, KVStoreError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(KVStoreError::io)?;

        #[cfg(feature = "locking")]
        let lock = WriterLock::acquire(data_dir)?;

        let path = data_dir.join(Self::LOG_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(KVStoreError::io)?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(KVStoreError::io)?;
        let (data, valid_len) = replay(&bytes);

        if valid_len < bytes.len() {
            warn!(
                "[li-01] Truncating torn tail of {}: {} of {} bytes valid",
                path.display(),
                valid_len,
                bytes.len()
            );
            file.set_len(valid_len as u64).map_err(KVStoreError::io)?;
            file.sync_all().map_err(KVStoreError::io)?;
        }

        info!(
            "[li-01] Opened {} ({} keys, {} bytes)",
            path.display(),
            data.len(),
            valid_len
        );

        Ok(Self {
            data,
            log: Some(file),
            path,
            sync_writes,
            #[cfg(feature = "locking")]
            _lock: Some(lock),
        })
    }

    /// Open a read-only snapshot of the store in `data_dir`.
    ///
    /// Does not lock, so it may run alongside a writer. Sees every record
    /// fully appended before the call.
    pub fn open_read_only(data_dir: impl AsRef<Path>) -> Result<Self, KVStoreError> {
        let path = data_dir.as_ref().join(Self::LOG_FILE);
        let bytes = std::fs::read(&path).map_err(|e| KVStoreError::IOError {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let (data, _) = replay(&bytes);

        Ok(Self {
            data,
            log: None,
            path,
            sync_writes: false,
            #[cfg(feature = "locking")]
            _lock: None,
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.atomic_batch_write(vec![BatchOperation::put(key, value)])
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.atomic_batch_write(vec![BatchOperation::delete(key)])
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let log = self.log.as_mut().ok_or(KVStoreError::ReadOnly)?;
        if operations.is_empty() {
            return Ok(());
        }
        log.write_all(&encode_record(&operations))
            .map_err(KVStoreError::io)?;
        if self.sync_writes {
            log.sync_data().map_err(KVStoreError::io)?;
        }
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

    fn is_read_only(&self) -> bool {
        self.log.is_none()
    }
}

fn encode_record(operations: &[BatchOperation]) -> Vec<u8> {
    let mut body = Vec::new();
    for op in operations {
        let (tag, key, value) = match op {
            BatchOperation::Put { key, value } => (TAG_PUT, key.as_slice(), value.as_slice()),
            BatchOperation::Delete { key } => (TAG_DELETE, key.as_slice(), &[][..]),
        };
        body.push(tag);
        body.extend_from_slice(&(key.len() as u32).to_le_bytes());
        body.extend_from_slice(&(value.len() as u32).to_le_bytes());
        body.extend_from_slice(key);
        body.extend_from_slice(value);
    }

    let mut record = Vec::with_capacity(RECORD_HEADER_LEN + body.len());
    record.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    record.extend_from_slice(&(body.len() as u32).to_le_bytes());
    record.extend_from_slice(&body);
    record
}

/// Replay a log. Returns the live map and the length of the valid prefix.
fn replay(bytes: &[u8]) -> (BTreeMap<Vec<u8>, Vec<u8>>, usize) {
    let mut data = BTreeMap::new();
    let mut cursor = 0;

    while let Some((operations, next)) = read_record(bytes, cursor) {
        for op in operations {
            op.apply_to(&mut data);
        }
        cursor = next;
    }

    (data, cursor)
}

fn read_record(bytes: &[u8], at: usize) -> Option<(Vec<BatchOperation>, usize)> {
    let header = bytes.get(at..at.checked_add(RECORD_HEADER_LEN)?)?;
    let checksum = u32::from_le_bytes(header[0..4].try_into().ok()?);
    let body_len = u32::from_le_bytes(header[4..8].try_into().ok()?) as usize;

    let body_start = at + RECORD_HEADER_LEN;
    let end = body_start.checked_add(body_len)?;
    let body = bytes.get(body_start..end)?;
    if crc32fast::hash(body) != checksum {
        return None;
    }

    Some((decode_ops(body)?, end))
}

fn decode_ops(mut body: &[u8]) -> Option<Vec<BatchOperation>> {
    let mut operations = Vec::new();
    while !body.is_empty() {
        let header = body.get(..OP_HEADER_LEN)?;
        let tag = header[0];
        let key_len = u32::from_le_bytes(header[1..5].try_into().ok()?) as usize;
        let value_len = u32::from_le_bytes(header[5..9].try_into().ok()?) as usize;

        let key_end = OP_HEADER_LEN.checked_add(key_len)?;
        let value_end = key_end.checked_add(value_len)?;
        let key = body.get(OP_HEADER_LEN..key_end)?.to_vec();
        let value = body.get(key_end..value_end)?.to_vec();

        operations.push(match tag {
            TAG_PUT => BatchOperation::Put { key, value },
            TAG_DELETE => BatchOperation::Delete { key },
            _ => return None,
        });
        body = &body[value_end..];
    }
    Some(operations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reopen_restores_data() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = FileBackedKVStore::open(dir.path(), false).unwrap();
            store.put(b"000000001", b"one").unwrap();
            store.put(b"000000000", b"zero").unwrap();
            store.put(b"000000001", b"uno").unwrap();
        }

        let store = FileBackedKVStore::open(dir.path(), false).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(b"000000001").unwrap(), Some(b"uno".to_vec()));
        let (last, _) = store.last_entry().unwrap().unwrap();
        assert_eq!(last, b"000000001");
    }

    #[test]
    fn test_torn_tail_is_truncated() {
        let dir = TempDir::new().unwrap();
        let log_path;
        {
            let mut store = FileBackedKVStore::open(dir.path(), true).unwrap();
            store.put(b"a", b"1").unwrap();
            store.put(b"b", b"2").unwrap();
            log_path = store.path().to_path_buf();
        }

        // Simulate a crash halfway through appending a third record
        let full = std::fs::metadata(&log_path).unwrap().len();
        let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
        let torn = encode_record(&[BatchOperation::put(b"c".to_vec(), b"3".to_vec())]);
        file.write_all(&torn[..torn.len() / 2]).unwrap();
        drop(file);

        let mut store = FileBackedKVStore::open(dir.path(), false).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(std::fs::metadata(&log_path).unwrap().len(), full);

        // Appends after truncation replay cleanly
        store.put(b"c", b"3").unwrap();
        drop(store);
        let store = FileBackedKVStore::open(dir.path(), false).unwrap();
        assert_eq!(store.get(b"c").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = TempDir::new().unwrap();
        FileBackedKVStore::open(dir.path(), false)
            .unwrap()
            .put(b"k", b"v")
            .unwrap();

        let mut reader = FileBackedKVStore::open_read_only(dir.path()).unwrap();
        assert!(reader.is_read_only());
        assert_eq!(reader.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(matches!(reader.put(b"k", b"w"), Err(KVStoreError::ReadOnly)));
    }

    #[test]
    fn test_read_only_alongside_writer() {
        let dir = TempDir::new().unwrap();
        let mut writer = FileBackedKVStore::open(dir.path(), false).unwrap();
        writer.put(b"k1", b"v1").unwrap();

        let reader = FileBackedKVStore::open_read_only(dir.path()).unwrap();
        writer.put(b"k2", b"v2").unwrap();

        assert_eq!(reader.len(), 1);
        assert!(reader.get(b"k2").unwrap().is_none());
    }

    #[test]
    fn test_read_only_missing_store_fails() {
        let dir = TempDir::new().unwrap();
        assert!(FileBackedKVStore::open_read_only(dir.path().join("absent")).is_err());
    }

    #[cfg(feature = "locking")]
    #[test]
    fn test_second_writer_is_locked_out() {
        let dir = TempDir::new().unwrap();
        let _writer = FileBackedKVStore::open(dir.path(), false).unwrap();
        assert!(matches!(
            FileBackedKVStore::open(dir.path(), false),
            Err(KVStoreError::Locked { .. })
        ));
    }

    #[test]
    fn test_batch_and_delete_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = FileBackedKVStore::open(dir.path(), false).unwrap();
            store.put(b"a", b"1").unwrap();
            store
                .atomic_batch_write(vec![
                    BatchOperation::put(b"b".to_vec(), b"2".to_vec()),
                    BatchOperation::put(b"c".to_vec(), b"3".to_vec()),
                    BatchOperation::delete(b"a".to_vec()),
                ])
                .unwrap();
            store.delete(b"c").unwrap();
        }

        let store = FileBackedKVStore::open(dir.path(), false).unwrap();
        let keys: Vec<Vec<u8>> = store.iter_from(b"").unwrap().map(|r| r.unwrap().0).collect();
        assert_eq!(keys, vec![b"b".to_vec()]);
    }

    #[test]
    fn test_torn_batch_applies_nothing() {
        let ops = vec![
            BatchOperation::put(b"x".to_vec(), b"1".to_vec()),
            BatchOperation::put(b"y".to_vec(), b"2".to_vec()),
        ];
        let record = encode_record(&ops);
        let (data, len) = replay(&record[..record.len() - 1]);
        assert!(data.is_empty());
        assert_eq!(len, 0);

        let (data, len) = replay(&record);
        assert_eq!(data.len(), 2);
        assert_eq!(len, record.len());
    }

    #[test]
    fn test_replay_ignores_corrupt_record() {
        let mut bytes = encode_record(&[BatchOperation::put(b"a".to_vec(), b"1".to_vec())]);
        let mut bad = encode_record(&[BatchOperation::put(b"b".to_vec(), b"2".to_vec())]);
        bad[0] ^= 0xFF;
        let valid = bytes.len();
        bytes.extend_from_slice(&bad);

        let (data, len) = replay(&bytes);
        assert_eq!(data.len(), 1);
        assert_eq!(len, valid);
    }
}
