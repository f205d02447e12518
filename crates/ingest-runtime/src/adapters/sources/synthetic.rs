//! # Synthetic Source
//!
//! A deterministic generated ledger for demos and soak runs. Block `n` is
//! derived from `(seed, n)` alone, so every fetch of a page yields the same
//! records. Page fetches fail at random with `failure_rate`, after
//! delivering half the page.

use async_trait::async_trait;
use li_03_page_sync::{BlockSource, EventSink, FetchError, PageRange};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{BlockRecord, Hash, TransactionRecord, U256};
use tracing::debug;

use super::deliver_concurrently;

const GENESIS_TIMESTAMP: u64 = 1_438_269_973;
const BLOCK_INTERVAL_SECS: u64 = 14;
const TRANSFER_GAS: u64 = 21_000;

/// Generated ledger of `length` blocks.
pub struct SyntheticSource {
    length: u64,
    max_transactions: u32,
    seed: u64,
    workers: usize,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl SyntheticSource {
    pub fn new(
        length: u64,
        max_transactions: u32,
        seed: u64,
        workers: usize,
        failure_rate: f64,
    ) -> Self {
        Self {
            length,
            max_transactions,
            seed,
            workers,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn block_rng(&self, number: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed.rotate_left(17) ^ number.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    fn block_hash(&self, number: u64) -> Hash {
        self.block_rng(number).gen()
    }

    /// The full block `number`, transactions included.
    pub fn block(&self, number: u64) -> BlockRecord {
        let mut rng = self.block_rng(number);
        let hash: Hash = rng.gen();
        let tx_count = rng.gen_range(0..=self.max_transactions);

        let mut block = BlockRecord::header(number, hash, tx_count);
        block.parent_hash = match number {
            0 => [0u8; 32],
            n => self.block_hash(n - 1),
        };
        block.timestamp = GENESIS_TIMESTAMP + number * BLOCK_INTERVAL_SECS;
        block.miner = rng.gen();
        block.gas_limit = 8_000_000;
        block.gas_used = TRANSFER_GAS * u64::from(tx_count);
        block.transactions = (0..tx_count)
            .map(|index| {
                let mut tx = TransactionRecord::new(number, index, rng.gen());
                tx.from = rng.gen();
                // One in ten is a contract creation
                tx.to = (rng.gen_range(0..10) != 0).then(|| rng.gen());
                tx.value = U256::from(rng.gen::<u64>());
                tx.gas = TRANSFER_GAS;
                if tx.to.is_none() {
                    tx.input = (0..rng.gen_range(4..64)).map(|_| rng.gen()).collect();
                }
                tx
            })
            .collect();
        block
    }

    fn should_fail(&self) -> bool {
        self.failure_rate > 0.0 && self.rng.lock().gen_bool(self.failure_rate)
    }
}

#[async_trait]
impl BlockSource for SyntheticSource {
    async fn fetch_page(&self, range: PageRange, sink: EventSink) -> Result<(), FetchError> {
        let available_end = range.end.min(self.length);
        let mut blocks: Vec<BlockRecord> = (range.start..available_end)
            .map(|n| self.block(n))
            .collect();

        let fail = self.should_fail();
        if fail {
            blocks.truncate(blocks.len() / 2);
        }
        let delivery_seed = self.rng.lock().gen();
        deliver_concurrently(blocks, sink, self.workers, delivery_seed).await?;

        if fail {
            debug!("[li-rt] Injected failure for page {}", range);
            return Err(FetchError::Network("synthetic upstream failure".into()));
        }
        if available_end < range.end {
            return Err(FetchError::Incomplete {
                range,
                detail: format!("synthetic ledger ends at block {}", self.length),
            });
        }
        Ok(())
    }

    async fn latest_block(&self) -> Result<Option<u64>, FetchError> {
        Ok(self.length.checked_sub(1))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
