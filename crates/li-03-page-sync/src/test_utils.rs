//! In-memory block source with injectable failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use li_01_ledger_store::test_utils::{make_block, make_transaction};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared_types::{BlockRecord, LedgerEvent};

use crate::adapters::sink::EventSink;
use crate::domain::errors::FetchError;
use crate::domain::page::PageRange;
use crate::ports::outbound::BlockSource;

/// How an injected page failure behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Fail before delivering anything.
    Error,
    /// Deliver half the page, then fail.
    ErrorAfterHalf,
    /// Return success with one record missing.
    DropLastRecord,
    /// Deliver half the page, then never return.
    Stall,
    /// Deliver a transaction whose index equals its block's count first.
    BadIndex,
}

/// Serves a fixed ledger. Every page is delivered as header and
/// transaction events in a shuffled order that differs per fetch.
pub struct MemorySource {
    blocks: Vec<BlockRecord>,
    seed: u64,
    failures: Mutex<HashMap<u64, (FailureMode, u32)>>,
    fetches: AtomicUsize,
}

impl MemorySource {
    /// Serve `blocks`, which must be numbered `0..blocks.len()`.
    pub fn new(blocks: Vec<BlockRecord>, seed: u64) -> Self {
        Self {
            blocks,
            seed,
            failures: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// A ledger of `count` blocks with 0 to 3 transactions each.
    pub fn generate(count: u64, seed: u64) -> Self {
        let blocks = (0..count)
            .map(|n| make_block(n, ((n.wrapping_mul(7) ^ seed) % 4) as u32))
            .collect();
        Self::new(blocks, seed)
    }

    /// Fail the next `times` fetches of the page starting at `page_start`.
    pub fn with_failure(self, page_start: u64, mode: FailureMode, times: u32) -> Self {
        self.failures.lock().insert(page_start, (mode, times));
        self
    }

    /// Number of `fetch_page` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn blocks(&self) -> &[BlockRecord] {
        &self.blocks
    }

    fn take_failure(&self, page_start: u64) -> Option<FailureMode> {
        let mut failures = self.failures.lock();
        let (mode, remaining) = failures.get_mut(&page_start)?;
        if *remaining == 0 {
            return None;
        }
        *remaining -= 1;
        Some(*mode)
    }

    fn page_events(&self, range: PageRange, fetch_no: usize) -> Vec<LedgerEvent> {
        let mut events = Vec::new();
        for block in self.blocks.iter().filter(|b| range.contains(b.number)) {
            let mut header = block.clone();
            let transactions = std::mem::take(&mut header.transactions);
            events.push(LedgerEvent::Block(header));
            events.extend(transactions.into_iter().map(LedgerEvent::Transaction));
        }
        let mut rng = StdRng::seed_from_u64(self.seed ^ range.start ^ ((fetch_no as u64) << 32));
        events.shuffle(&mut rng);
        events
    }
}

#[async_trait]
impl BlockSource for MemorySource {
    async fn fetch_page(&self, range: PageRange, sink: EventSink) -> Result<(), FetchError> {
        let fetch_no = self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut events = self.page_events(range, fetch_no);

        let failure = self.take_failure(range.start);
        match failure {
            Some(FailureMode::Error) => {
                return Err(FetchError::Network("injected failure".into()));
            }
            Some(FailureMode::ErrorAfterHalf) | Some(FailureMode::Stall) => {
                events.truncate(events.len() / 2);
            }
            Some(FailureMode::DropLastRecord) => {
                events.pop();
            }
            Some(FailureMode::BadIndex) => {
                if let Some(block) = self.blocks.iter().find(|b| range.contains(b.number)) {
                    let bad = make_transaction(block.number, block.transaction_count);
                    events.insert(0, LedgerEvent::Transaction(bad));
                }
            }
            None => {}
        }

        for event in events {
            sink.send(event).await?;
            tokio::task::yield_now().await;
        }

        match failure {
            Some(FailureMode::ErrorAfterHalf) => {
                Err(FetchError::Network("connection reset mid-page".into()))
            }
            Some(FailureMode::Stall) => std::future::pending().await,
            _ => Ok(()),
        }
    }

    async fn latest_block(&self) -> Result<Option<u64>, FetchError> {
        Ok(self.blocks.last().map(|b| b.number))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
