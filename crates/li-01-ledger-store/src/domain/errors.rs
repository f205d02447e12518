//! # Domain Errors
//!
//! Error types for the Ledger Store.
//!
//! Integrity errors (`MalformedKey`, `CorruptLedger`) are fatal: they are
//! surfaced to the operator and never repaired automatically.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A stored key does not have the fixed-width block key form.
    #[error("Malformed key {key:?}: {reason}")]
    MalformedKey {
        /// Offending key, lossily rendered
        key: String,
        /// What was wrong with it
        reason: &'static str,
    },

    /// Block number does not fit the fixed key width.
    #[error("Block number {number} exceeds key width (max {max})")]
    KeyOutOfRange {
        /// Requested number
        number: u64,
        /// Largest encodable number
        max: u64,
    },

    /// The stored sequence violates a structural invariant.
    #[error("Corrupt ledger at block {number}: {reason}")]
    CorruptLedger {
        /// First offending block number
        number: u64,
        /// Description of the violation
        reason: String,
    },

    /// Attempt to move the persisted cursor backwards.
    #[error("Cursor cannot regress from {current} to {requested}")]
    CursorRegression {
        /// Currently persisted cursor
        current: u64,
        /// Rejected value
        requested: u64,
    },

    /// Underlying key-value store failure.
    #[error(transparent)]
    Store(#[from] KVStoreError),
}

impl LedgerError {
    /// Build a `CorruptLedger` error.
    pub fn corrupt(number: u64, reason: impl Into<String>) -> Self {
        LedgerError::CorruptLedger {
            number,
            reason: reason.into(),
        }
    }

    /// True for data-integrity failures.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            LedgerError::MalformedKey { .. } | LedgerError::CorruptLedger { .. }
        )
    }
}

/// Key-value store errors.
#[derive(Debug, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError {
        /// Backend message
        message: String,
    },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError {
        /// Backend message
        message: String,
    },

    /// Another process holds the writer lock.
    #[error("Database already in use by process {pid:?} ({path:?})")]
    Locked {
        /// PID recorded in the lock file, if readable
        pid: Option<u32>,
        /// Lock file path
        path: PathBuf,
    },

    /// Write attempted through a read-only handle.
    #[error("KV store opened read-only")]
    ReadOnly,
}

impl KVStoreError {
    /// Wrap an I/O error.
    pub fn io(err: impl std::fmt::Display) -> Self {
        KVStoreError::IOError {
            message: err.to_string(),
        }
    }
}
