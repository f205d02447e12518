//! # Hex Encoding Helpers
//!
//! Exporters and RPC providers render hashes and addresses as `0x`-prefixed
//! hex strings.

use crate::entities::{Address, Hash};
use thiserror::Error;

/// Hex decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexDecodeError {
    /// Input is not valid hex.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded value has the wrong length.
    #[error("Expected {expected} bytes, got {got}")]
    WrongLength {
        /// Required byte length
        expected: usize,
        /// Decoded byte length
        got: usize,
    },
}

/// Decode a hex string with optional `0x` prefix.
pub fn decode_hex_bytes(input: &str) -> Result<Vec<u8>, HexDecodeError> {
    let trimmed = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(trimmed).map_err(|e| HexDecodeError::InvalidHex(e.to_string()))
}

fn decode_fixed<const N: usize>(input: &str) -> Result<[u8; N], HexDecodeError> {
    let bytes = decode_hex_bytes(input)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| HexDecodeError::WrongLength {
            expected: N,
            got: bytes.len(),
        })
}

/// Decode a 32-byte hash.
pub fn decode_hash(input: &str) -> Result<Hash, HexDecodeError> {
    decode_fixed::<32>(input)
}

/// Decode a 20-byte address.
pub fn decode_address(input: &str) -> Result<Address, HexDecodeError> {
    decode_fixed::<20>(input)
}
