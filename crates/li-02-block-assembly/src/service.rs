//! # Reassembly Engine
//!
//! Single-consumer: every buffer mutation happens on the task that drains
//! the inbound event queue.

use shared_types::{BlockRecord, LedgerEvent, TransactionRecord};
use tracing::{debug, trace};

use crate::domain::config::AssemblyConfig;
use crate::domain::errors::AssemblyError;
use crate::domain::state::{BlockState, IncompleteBlock};
use crate::domain::window::PendingWindow;
use crate::ports::outbound::LedgerWriter;

/// Buffers out-of-order records and commits complete blocks in order.
pub struct ReassemblyEngine<W: LedgerWriter> {
    writer: W,
    window: PendingWindow,
    next_block: u64,
    /// Block written but not yet covered by the cursor.
    in_flight: Option<u64>,
    committed: u64,
}

impl<W: LedgerWriter> ReassemblyEngine<W> {
    /// Create an engine that expects `next_block` as the next commit.
    pub fn new(writer: W, config: AssemblyConfig, next_block: u64) -> Result<Self, AssemblyError> {
        config.validate()?;
        Ok(Self {
            writer,
            window: PendingWindow::new(config.window_size),
            next_block,
            in_flight: None,
            committed: 0,
        })
    }

    /// Apply one event. Returns how many blocks it committed.
    pub fn apply(&mut self, event: LedgerEvent) -> Result<usize, AssemblyError> {
        match event {
            LedgerEvent::Block(block) => self.on_block(block),
            LedgerEvent::Transaction(tx) => self.on_transaction(tx),
        }
    }

    /// A block record arrived. Embedded transactions count as separate
    /// transaction arrivals.
    pub fn on_block(&mut self, mut block: BlockRecord) -> Result<usize, AssemblyError> {
        let number = block.number;
        if !self.admit(number)? {
            return Ok(0);
        }

        let embedded = std::mem::take(&mut block.transactions);
        if let Some(tx) = embedded.iter().find(|tx| tx.block_number != number) {
            return Err(AssemblyError::violation(
                number,
                format!("embedded transaction belongs to block {}", tx.block_number),
            ));
        }

        let slot = self.window.claim(number)?;
        slot.set_header(block)?;
        for tx in embedded {
            slot.insert_transaction(tx)?;
        }
        trace!("[li-02] Header for block {} buffered", number);

        self.drain_if_complete(number)
    }

    /// A transaction record arrived.
    pub fn on_transaction(&mut self, tx: TransactionRecord) -> Result<usize, AssemblyError> {
        let number = tx.block_number;
        if !self.admit(number)? {
            return Ok(0);
        }

        self.window.claim(number)?.insert_transaction(tx)?;
        self.drain_if_complete(number)
    }

    /// Decide whether an event for `number` enters the buffer.
    ///
    /// Retired numbers are re-deliveries and are dropped. Numbers past the
    /// window are a violation.
    fn admit(&self, number: u64) -> Result<bool, AssemblyError> {
        if number < self.next_block {
            trace!("[li-02] Ignoring record for retired block {}", number);
            return Ok(false);
        }
        let limit = self.window_end();
        if number >= limit {
            return Err(AssemblyError::violation(
                number,
                format!(
                    "outside pending window [{}, {})",
                    self.next_block, limit
                ),
            ));
        }
        Ok(true)
    }

    fn drain_if_complete(&mut self, number: u64) -> Result<usize, AssemblyError> {
        let complete = self.window.get(number).is_some_and(|slot| slot.is_complete());
        if complete && number == self.next_block {
            self.drain()
        } else {
            Ok(0)
        }
    }

    /// Commit complete blocks from the cursor upward until a gap.
    fn drain(&mut self) -> Result<usize, AssemblyError> {
        let mut drained = 0;
        while self
            .window
            .get(self.next_block)
            .is_some_and(|slot| slot.is_complete())
        {
            let number = self.next_block;
            let block = self
                .window
                .take(number)
                .and_then(|slot| slot.assemble())
                .ok_or_else(|| AssemblyError::violation(number, "complete slot vanished"))?;

            self.writer.put_block(&block)?;
            self.in_flight = Some(number);
            self.writer.store_cursor(number + 1)?;
            self.in_flight = None;

            self.next_block = number + 1;
            self.committed += 1;
            drained += 1;
            debug!(
                "[li-02] Committed block {} ({} transactions)",
                number,
                block.transactions.len()
            );
        }
        Ok(drained)
    }

    /// Lifecycle state of `number`.
    pub fn state_of(&self, number: u64) -> BlockState {
        if self.in_flight == Some(number) {
            return BlockState::Committed;
        }
        if number < self.next_block {
            return BlockState::Retired;
        }
        if number >= self.window_end() {
            return BlockState::Unseen;
        }
        match self.window.get(number) {
            None => BlockState::Unseen,
            Some(slot) if slot.is_complete() => BlockState::Complete,
            Some(_) => BlockState::Buffering,
        }
    }

    /// The lowest block not yet retired and what it is missing.
    ///
    /// It is never complete: a complete block at the cursor drains at once.
    pub fn lowest_incomplete(&self) -> IncompleteBlock {
        let slot = self.window.get(self.next_block);
        IncompleteBlock {
            number: self.next_block,
            expected_transactions: slot.and_then(|s| s.expected_transactions()),
            received_transactions: slot.map_or(0, |s| s.received_transactions()),
        }
    }

    /// Number of block numbers with buffered records.
    pub fn pending_len(&self) -> usize {
        self.window.occupied()
    }

    /// Lowest block number not yet committed.
    pub fn next_block(&self) -> u64 {
        self.next_block
    }

    /// Blocks committed by this engine.
    pub fn committed(&self) -> u64 {
        self.committed
    }

    /// Exclusive upper bound of the pending window.
    pub fn window_end(&self) -> u64 {
        self.next_block.saturating_add(self.window.size() as u64)
    }

    /// Discard every buffered record. The cursor is untouched.
    pub fn reset(&mut self) {
        if self.window.occupied() > 0 {
            debug!(
                "[li-02] Discarding {} partial blocks from {}",
                self.window.occupied(),
                self.next_block
            );
        }
        self.window.clear();
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}
