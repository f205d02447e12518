//! # Domain Errors
//!
//! Fetch failures are page-level and retryable. Everything else aborts
//! the run with the last committed block still persisted.

use std::time::Duration;

use li_01_ledger_store::LedgerError;
use li_02_block_assembly::AssemblyError;
use thiserror::Error;

use super::page::PageRange;

/// A page could not be fetched in full. Retried by re-requesting the page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The fetch returned but some record never arrived.
    #[error("Page {range} incomplete: {detail}")]
    Incomplete { range: PageRange, detail: String },

    /// The consumer went away mid-fetch.
    #[error("Event sink closed")]
    SinkClosed,

    /// The fetch task panicked or was aborted.
    #[error("Fetch task failed: {0}")]
    TaskFailed(String),
}

/// Errors that end a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Page {range} failed after {attempts} attempts: {last}")]
    PageRetriesExhausted {
        range: PageRange,
        attempts: u32,
        last: FetchError,
    },

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The source could not report its tip.
    #[error("Source unavailable: {0}")]
    Source(FetchError),

    #[error("Invalid sync config: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// True for data integrity and ordering failures, which must never be
    /// retried.
    pub fn is_integrity_violation(&self) -> bool {
        match self {
            SyncError::Assembly(AssemblyError::OrderingViolation { .. }) => true,
            SyncError::Assembly(AssemblyError::Ledger(e)) | SyncError::Ledger(e) => {
                e.is_integrity_violation()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_message() {
        let err = SyncError::PageRetriesExhausted {
            range: PageRange::new(0, 10),
            attempts: 3,
            last: FetchError::Network("reset by peer".into()),
        };
        assert_eq!(
            err.to_string(),
            "Page [0, 10) failed after 3 attempts: Network error: reset by peer"
        );
        assert!(!err.is_integrity_violation());
    }

    #[test]
    fn test_integrity_classification() {
        let ordering = SyncError::from(AssemblyError::OrderingViolation {
            number: 4,
            reason: "index 3 of 3".into(),
        });
        assert!(ordering.is_integrity_violation());

        let corrupt = SyncError::from(LedgerError::corrupt(2, "gap"));
        assert!(corrupt.is_integrity_violation());
    }
}
