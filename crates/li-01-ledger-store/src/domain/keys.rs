//! # Key Codec
//!
//! Fixed-width, zero-padded ASCII decimal keys. Ascending numeric order is
//! ascending byte-lexicographic order, which is what lets the store answer
//! "highest committed block" with a single last-entry query.
//!
//! ```text
//! block 42           -> b"000000042"
//! cursor             -> b"#next_block"
//! ```

use crate::domain::errors::LedgerError;

/// Digits in a block key.
pub const BLOCK_KEY_WIDTH: usize = 9;

/// Largest block number representable in `BLOCK_KEY_WIDTH` digits.
pub const MAX_BLOCK_NUMBER: u64 = 999_999_999;

/// Key of the persisted cursor record. `#` sorts below every digit.
pub const CURSOR_KEY: &[u8] = b"#next_block";

/// Encoded block key.
pub type BlockKey = [u8; BLOCK_KEY_WIDTH];

/// Encode a block number.
pub fn encode_block_key(number: u64) -> Result<BlockKey, LedgerError> {
    if number > MAX_BLOCK_NUMBER {
        return Err(LedgerError::KeyOutOfRange {
            number,
            max: MAX_BLOCK_NUMBER,
        });
    }
    let mut key = [b'0'; BLOCK_KEY_WIDTH];
    write_digits(&mut key, number);
    Ok(key)
}

/// Decode a block key.
pub fn decode_block_key(key: &[u8]) -> Result<u64, LedgerError> {
    if key.len() != BLOCK_KEY_WIDTH {
        return Err(malformed(key, "block key must be 9 bytes"));
    }
    read_digits(key).ok_or_else(|| malformed(key, "block key must be ASCII digits"))
}

/// True if `key` lives in the block namespace (as opposed to metadata).
pub fn is_block_key(key: &[u8]) -> bool {
    key.len() == BLOCK_KEY_WIDTH && key.iter().all(u8::is_ascii_digit)
}

fn write_digits(out: &mut [u8], mut value: u64) {
    for slot in out.iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }
}

fn read_digits(bytes: &[u8]) -> Option<u64> {
    bytes.iter().try_fold(0u64, |acc, b| {
        b.is_ascii_digit().then(|| acc * 10 + u64::from(b - b'0'))
    })
}

fn malformed(key: &[u8], reason: &'static str) -> LedgerError {
    LedgerError::MalformedKey {
        key: String::from_utf8_lossy(key).into_owned(),
        reason,
    }
}
