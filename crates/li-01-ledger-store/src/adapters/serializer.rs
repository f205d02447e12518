//! # Block Serializer
//!
//! Stored value layout: `crc32 (4 bytes, LE) || bincode(BlockRecord)`.
//! The checksum is computed at write time and verified on every read.

use crate::domain::errors::LedgerError;
use shared_types::BlockRecord;

const CHECKSUM_LEN: usize = 4;

/// Encodes and decodes stored block values.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockCodec;

impl BlockCodec {
    /// Serialize a block with its checksum prefix.
    pub fn encode(&self, block: &BlockRecord) -> Result<Vec<u8>, LedgerError> {
        let body = bincode::serialize(block)
            .map_err(|e| LedgerError::corrupt(block.number, format!("encode failed: {e}")))?;
        let mut value = Vec::with_capacity(CHECKSUM_LEN + body.len());
        value.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
        value.extend_from_slice(&body);
        Ok(value)
    }

    /// Verify the checksum and deserialize. `number` is the key-derived
    /// block number, used for error reporting.
    pub fn decode(&self, number: u64, value: &[u8]) -> Result<BlockRecord, LedgerError> {
        if value.len() < CHECKSUM_LEN {
            return Err(LedgerError::corrupt(number, "value shorter than checksum"));
        }
        let (prefix, body) = value.split_at(CHECKSUM_LEN);
        let expected = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
        let actual = crc32fast::hash(body);
        if expected != actual {
            return Err(LedgerError::corrupt(
                number,
                format!("checksum mismatch: expected {expected:08x}, got {actual:08x}"),
            ));
        }
        bincode::deserialize(body)
            .map_err(|e| LedgerError::corrupt(number, format!("decode failed: {e}")))
    }
}
