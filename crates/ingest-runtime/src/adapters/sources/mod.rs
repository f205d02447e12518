//! # Block Sources
//!
//! `BlockSource` implementations shipped with the runtime. Both deliver a
//! page through a bounded pool of concurrent workers, each sending its
//! share of the page's records in shuffled order.

pub mod export_file;
pub mod synthetic;

pub use export_file::ExportFileSource;
pub use synthetic::SyntheticSource;

use std::path::PathBuf;
use std::sync::Arc;

use li_03_page_sync::{BlockSource, EventSink, FetchError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use shared_types::{BlockRecord, LedgerEvent};
use thiserror::Error;
use tokio::task::JoinSet;

use crate::container::config::{SourceConfig, SourceKind};

/// Errors building a source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?} line {line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Export is inconsistent at block {number}: {reason}")]
    Inconsistent { number: u64, reason: String },
}

/// Build the configured source.
pub fn build_source(config: &SourceConfig) -> Result<Arc<dyn BlockSource>, SourceError> {
    match config.kind {
        SourceKind::Export => Ok(Arc::new(ExportFileSource::open(
            &config.export_dir,
            config.workers,
            config.seed,
        )?)),
        SourceKind::Synthetic => Ok(Arc::new(SyntheticSource::new(
            config.synthetic_blocks,
            config.synthetic_max_transactions,
            config.seed,
            config.workers,
            config.failure_rate,
        ))),
    }
}

/// Send `blocks` as header and transaction events through `workers`
/// concurrent tasks.
///
/// Headers are dealt round-robin; every transaction goes to a random lane,
/// so a block's transactions routinely overtake its header.
pub(crate) async fn deliver_concurrently(
    blocks: Vec<BlockRecord>,
    sink: EventSink,
    workers: usize,
    seed: u64,
) -> Result<(), FetchError> {
    let workers = workers.max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut lanes: Vec<Vec<LedgerEvent>> = vec![Vec::new(); workers];

    for (i, mut block) in blocks.into_iter().enumerate() {
        let transactions = std::mem::take(&mut block.transactions);
        lanes[i % workers].push(LedgerEvent::Block(block));
        for tx in transactions {
            lanes[rng.gen_range(0..workers)].push(LedgerEvent::Transaction(tx));
        }
    }

    let mut tasks = JoinSet::new();
    for mut lane in lanes {
        lane.shuffle(&mut rng);
        let sink = sink.clone();
        tasks.spawn(async move {
            for event in lane {
                sink.send(event).await?;
                tokio::task::yield_now().await;
            }
            Ok::<(), FetchError>(())
        });
    }
    drop(sink);

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let result = joined.unwrap_or_else(|e| Err(FetchError::TaskFailed(e.to_string())));
        if let Err(e) = result {
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}
