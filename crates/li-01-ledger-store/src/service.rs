//! # Ledger Store Service
//!
//! Typed facade over a `KeyValueStore`: blocks in, blocks out, plus the
//! persisted cursor and whole-ledger validation.

use shared_types::BlockRecord;
use tracing::{debug, info};

use crate::adapters::serializer::BlockCodec;
use crate::domain::errors::LedgerError;
use crate::domain::keys::{decode_block_key, encode_block_key, is_block_key, CURSOR_KEY};
use crate::domain::validation::{check_stored_block, ValidationReport};
use crate::ports::outbound::{KeyValueStore, KvIter};

/// The Ledger Store.
///
/// Single-writer: only the reassembly drain loop holds a writable handle.
/// Validation passes open their own read-only handle.
pub struct LedgerStore<S: KeyValueStore> {
    store: S,
    codec: BlockCodec,
    /// Last cursor value read or written through this handle.
    cursor: Option<u64>,
}

impl<S: KeyValueStore> LedgerStore<S> {
    /// Wrap an opened key-value store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            codec: BlockCodec,
            cursor: None,
        }
    }

    /// Write a block under its key. Overwrites are idempotent.
    pub fn put(&mut self, block: &BlockRecord) -> Result<(), LedgerError> {
        let key = encode_block_key(block.number)?;
        let value = self.codec.encode(block)?;
        self.store.put(&key, &value)?;
        Ok(())
    }

    /// Read a block.
    pub fn get(&self, number: u64) -> Result<Option<BlockRecord>, LedgerError> {
        let key = encode_block_key(number)?;
        match self.store.get(&key)? {
            Some(value) => self.codec.decode(number, &value).map(Some),
            None => Ok(None),
        }
    }

    /// The highest committed block.
    pub fn ceiling_entry(&self) -> Result<Option<(u64, BlockRecord)>, LedgerError> {
        let Some((key, value)) = self.store.last_entry()? else {
            return Ok(None);
        };
        // Metadata sorts below every block key: a metadata key on top
        // means there are no blocks at all.
        if !is_block_key(&key) && key.starts_with(b"#") {
            return Ok(None);
        }
        let number = decode_block_key(&key)?;
        let block = self.codec.decode(number, &value)?;
        Ok(Some((number, block)))
    }

    /// Lazily iterate blocks from `number` upward.
    ///
    /// Each call starts a fresh scan.
    pub fn range_from(&self, number: u64) -> Result<BlockRange<'_>, LedgerError> {
        let start = encode_block_key(number)?;
        Ok(BlockRange {
            inner: self.store.iter_from(&start)?,
            codec: &self.codec,
        })
    }

    /// Validate the whole ledger, starting at block 0.
    pub fn validate(&self) -> Result<ValidationReport, LedgerError> {
        self.validate_from(0)
    }

    /// Validate from `from` to the end of the store.
    ///
    /// Fails with `CorruptLedger` on the first gap, duplicate, or shape
    /// violation. Never repairs.
    pub fn validate_from(&self, from: u64) -> Result<ValidationReport, LedgerError> {
        let mut report = ValidationReport::default();
        let mut expected = from;

        for entry in self.range_from(from)? {
            let (key_number, block) = entry?;
            check_stored_block(key_number, expected, &block)?;
            report.record(&block);
            if report.blocks % 100_000 == 0 {
                info!("[li-01] Validated through block {}", key_number);
            }
            expected += 1;
        }

        Ok(report)
    }

    /// The explicitly persisted cursor, if any.
    pub fn cursor(&self) -> Result<Option<u64>, LedgerError> {
        let Some(bytes) = self.store.get(CURSOR_KEY)? else {
            return Ok(None);
        };
        let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
            LedgerError::corrupt(0, format!("cursor record has {} bytes", bytes.len()))
        })?;
        Ok(Some(u64::from_be_bytes(raw)))
    }

    /// Persist the cursor. Rejects any attempt to move it backwards.
    pub fn store_cursor(&mut self, next_block: u64) -> Result<(), LedgerError> {
        let current = match self.cursor {
            Some(current) => Some(current),
            None => self.cursor()?,
        };
        if let Some(current) = current {
            if next_block < current {
                return Err(LedgerError::CursorRegression {
                    current,
                    requested: next_block,
                });
            }
        }
        self.store.put(CURSOR_KEY, &next_block.to_be_bytes())?;
        self.cursor = Some(next_block);
        debug!("[li-01] Cursor advanced to {}", next_block);
        Ok(())
    }

    /// Where ingestion resumes: the explicit cursor, else one past the
    /// ceiling entry, else 0.
    pub fn resume_point(&self) -> Result<u64, LedgerError> {
        if let Some(cursor) = self.cursor()? {
            return Ok(cursor);
        }
        Ok(self
            .ceiling_entry()?
            .map(|(number, _)| number + 1)
            .unwrap_or(0))
    }

    /// True if the underlying handle rejects writes.
    pub fn is_read_only(&self) -> bool {
        self.store.is_read_only()
    }

    /// Borrow the underlying store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Unwrap the underlying store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

/// Ascending iterator over stored blocks.
pub struct BlockRange<'a> {
    inner: KvIter<'a>,
    codec: &'a BlockCodec,
}

impl Iterator for BlockRange<'_> {
    type Item = Result<(u64, BlockRecord), LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.inner.next()?;
        Some(entry.map_err(LedgerError::from).and_then(|(key, value)| {
            let number = decode_block_key(&key)?;
            let block = self.codec.decode(number, &value)?;
            Ok((number, block))
        }))
    }
}
