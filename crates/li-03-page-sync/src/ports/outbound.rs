//! # Outbound Ports
//!
//! The fetch collaborator.

use async_trait::async_trait;

use crate::adapters::sink::EventSink;
use crate::domain::errors::FetchError;
use crate::domain::page::PageRange;

/// Source of block and transaction records.
///
/// Implementations may fetch with internal parallelism and deliver records
/// in any order, through any number of clones of the sink.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Deliver every block and transaction in `range` at least once.
    ///
    /// Returns a single aggregate error if any record could not be
    /// retrieved. Records delivered before the error are still consumed.
    async fn fetch_page(&self, range: PageRange, sink: EventSink) -> Result<(), FetchError>;

    /// Highest block number the source can serve, if it has any.
    async fn latest_block(&self) -> Result<Option<u64>, FetchError>;

    /// Short label for logging.
    fn name(&self) -> &str;
}
