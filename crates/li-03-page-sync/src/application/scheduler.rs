//! # Page Scheduler
//!
//! Requests one page at a time and feeds its events to the engine. The
//! next page is requested only after the cursor passed the current page's
//! end, so memory stays bounded to one page of buffered blocks.

use std::sync::Arc;

use li_02_block_assembly::{LedgerWriter, ReassemblyEngine};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::adapters::sink::event_channel;
use crate::config::SyncConfig;
use crate::domain::errors::{FetchError, SyncError};
use crate::domain::outcome::SyncOutcome;
use crate::domain::page::PageRange;
use crate::ports::outbound::BlockSource;

/// Result of one page attempt that did not hit a fatal error.
enum PageAttempt {
    Drained,
    Failed(FetchError),
    Cancelled,
}

/// Drives a `ReassemblyEngine` page by page.
pub struct PageScheduler<S: BlockSource + ?Sized + 'static> {
    source: Arc<S>,
    config: SyncConfig,
    shutdown: watch::Receiver<bool>,
}

impl<S: BlockSource + ?Sized + 'static> PageScheduler<S> {
    pub fn new(
        source: Arc<S>,
        config: SyncConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, SyncError> {
        config.validate()?;
        Ok(Self {
            source,
            config,
            shutdown,
        })
    }

    /// Sync every block from the engine's cursor through `last_block`
    /// (inclusive).
    pub async fn run<W: LedgerWriter>(
        &mut self,
        engine: &mut ReassemblyEngine<W>,
        last_block: u64,
    ) -> Result<SyncOutcome, SyncError> {
        let committed_before = engine.committed();
        let stop = |engine: &ReassemblyEngine<W>| SyncOutcome::Cancelled {
            next_block: engine.next_block(),
            committed: engine.committed() - committed_before,
        };

        while engine.next_block() <= last_block {
            if *self.shutdown.borrow() {
                engine.reset();
                return Ok(stop(&*engine));
            }

            let page = PageRange::starting_at(engine.next_block(), self.config.page_size, last_block);
            if !self.sync_page(engine, page).await? {
                engine.reset();
                info!(
                    "[li-03] Shutdown requested, stopping at block {}",
                    engine.next_block()
                );
                return Ok(stop(&*engine));
            }
            info!(
                "[li-03] Page {} committed, cursor at {}",
                page,
                engine.next_block()
            );
        }

        Ok(SyncOutcome::Completed {
            next_block: engine.next_block(),
            committed: engine.committed() - committed_before,
        })
    }

    /// Fetch one page until it drains, retrying it whole on failure.
    ///
    /// Returns `false` if shutdown was requested.
    async fn sync_page<W: LedgerWriter>(
        &mut self,
        engine: &mut ReassemblyEngine<W>,
        page: PageRange,
    ) -> Result<bool, SyncError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            engine.reset();
            debug!("[li-03] Fetching page {} (attempt {})", page, attempt);

            let error = match self.fetch_once(engine, page).await? {
                PageAttempt::Drained => return Ok(true),
                PageAttempt::Cancelled => return Ok(false),
                PageAttempt::Failed(error) => error,
            };

            if attempt >= self.config.max_page_attempts {
                return Err(SyncError::PageRetriesExhausted {
                    range: page,
                    attempts: attempt,
                    last: error,
                });
            }

            let delay = self.config.backoff(attempt);
            warn!(
                "[li-03] Page {} attempt {} failed: {}; retrying in {:?}",
                page, attempt, error, delay
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wait_for_shutdown(&mut self.shutdown) => return Ok(false),
            }
        }
    }

    /// One fetch of `page`: spawn the source, consume its events until the
    /// queue closes, then check that the page drained.
    async fn fetch_once<W: LedgerWriter>(
        &mut self,
        engine: &mut ReassemblyEngine<W>,
        page: PageRange,
    ) -> Result<PageAttempt, SyncError> {
        let (sink, mut events) = event_channel(self.config.queue_capacity);
        let source = Arc::clone(&self.source);
        let mut fetch = tokio::spawn(async move { source.fetch_page(page, sink).await });

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if let Err(e) = engine.apply(event) {
                            fetch.abort();
                            return Err(e.into());
                        }
                    }
                    None => break,
                },
                _ = wait_for_shutdown(&mut self.shutdown) => {
                    fetch.abort();
                    return Ok(PageAttempt::Cancelled);
                }
            }
        }

        let result = match (&mut fetch).await {
            Ok(result) => result,
            Err(e) => Err(FetchError::TaskFailed(e.to_string())),
        };
        if let Err(error) = result {
            return Ok(PageAttempt::Failed(error));
        }

        if engine.next_block() < page.end {
            return Ok(PageAttempt::Failed(FetchError::Incomplete {
                range: page,
                detail: engine.lowest_incomplete().to_string(),
            }));
        }
        Ok(PageAttempt::Drained)
    }
}

/// Resolves once shutdown is signalled. Never resolves if the sender is
/// gone without signalling.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
