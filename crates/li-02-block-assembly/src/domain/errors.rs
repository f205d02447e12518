//! Error types for block assembly.

use li_01_ledger_store::LedgerError;
use thiserror::Error;

/// Assembly errors. All of them are fatal to the current run.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// A record contradicts the window or its block's declared shape.
    #[error("Ordering violation at block {number}: {reason}")]
    OrderingViolation { number: u64, reason: String },

    /// Configuration rejected at construction.
    #[error("Invalid assembly config: {0}")]
    InvalidConfig(&'static str),

    /// The commit target failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl AssemblyError {
    pub(crate) fn violation(number: u64, reason: impl Into<String>) -> Self {
        AssemblyError::OrderingViolation {
            number,
            reason: reason.into(),
        }
    }
}
