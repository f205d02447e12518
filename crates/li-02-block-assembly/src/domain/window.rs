//! # Pending Window
//!
//! Arena of `window_size` slots indexed by `number % window_size`. While
//! every buffered number lies in `[next_block, next_block + window_size)`
//! no two of them share a slot, so claiming and retiring are O(1).

use std::collections::BTreeMap;

use shared_types::{BlockRecord, TransactionRecord};

use super::errors::AssemblyError;

/// Partial assembly of one block.
#[derive(Debug, Clone)]
pub struct Slot {
    number: u64,
    header: Option<BlockRecord>,
    transactions: BTreeMap<u32, TransactionRecord>,
}

impl Slot {
    fn new(number: u64) -> Self {
        Self {
            number,
            header: None,
            transactions: BTreeMap::new(),
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    /// Declared transaction count, once the header arrived.
    pub fn expected_transactions(&self) -> Option<u32> {
        self.header.as_ref().map(|h| h.transaction_count)
    }

    /// Distinct transaction indices received.
    pub fn received_transactions(&self) -> usize {
        self.transactions.len()
    }

    /// Store the header. A later header overwrites an earlier one.
    ///
    /// Every already buffered index must fit the declared count.
    pub fn set_header(&mut self, mut header: BlockRecord) -> Result<(), AssemblyError> {
        if let Some((&index, _)) = self.transactions.iter().next_back() {
            if index >= header.transaction_count {
                return Err(AssemblyError::violation(
                    self.number,
                    format!(
                        "buffered transaction index {index} but block declares {} transactions",
                        header.transaction_count
                    ),
                ));
            }
        }
        header.transactions.clear();
        self.header = Some(header);
        Ok(())
    }

    /// Store a transaction at its index. A duplicate index overwrites.
    pub fn insert_transaction(&mut self, tx: TransactionRecord) -> Result<(), AssemblyError> {
        if let Some(expected) = self.expected_transactions() {
            if tx.transaction_index >= expected {
                return Err(AssemblyError::violation(
                    self.number,
                    format!(
                        "transaction index {} but block declares {expected} transactions",
                        tx.transaction_index
                    ),
                ));
            }
        }
        self.transactions.insert(tx.transaction_index, tx);
        Ok(())
    }

    /// Header present and every index in `[0, transaction_count)` present.
    ///
    /// Indices are checked against the count on insert, so counting
    /// distinct indices is enough.
    pub fn is_complete(&self) -> bool {
        self.expected_transactions()
            .is_some_and(|expected| self.transactions.len() == expected as usize)
    }

    /// Build the final block with transactions in index order.
    pub fn assemble(self) -> Option<BlockRecord> {
        if !self.is_complete() {
            return None;
        }
        let mut block = self.header?;
        block.transactions = self.transactions.into_values().collect();
        Some(block)
    }
}

/// Fixed-size arena of pending slots.
#[derive(Debug)]
pub struct PendingWindow {
    slots: Vec<Option<Slot>>,
    occupied: usize,
}

impl PendingWindow {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
            occupied: 0,
        }
    }

    /// Number of slots.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    fn index(&self, number: u64) -> usize {
        (number % self.slots.len() as u64) as usize
    }

    /// The slot holding `number`, if any.
    pub fn get(&self, number: u64) -> Option<&Slot> {
        self.slots[self.index(number)]
            .as_ref()
            .filter(|slot| slot.number == number)
    }

    /// The slot for `number`, claiming it if free.
    ///
    /// The caller keeps `number` inside the window; a slot still held by a
    /// different number means that contract was broken.
    pub fn claim(&mut self, number: u64) -> Result<&mut Slot, AssemblyError> {
        let index = self.index(number);
        match self.slots[index].as_ref().map(Slot::number) {
            Some(held) if held != number => {
                return Err(AssemblyError::violation(
                    number,
                    format!("slot {index} still held by block {held}"),
                ));
            }
            Some(_) => {}
            None => self.occupied += 1,
        }
        Ok(self.slots[index].get_or_insert_with(|| Slot::new(number)))
    }

    /// Free the slot holding `number` and return its contents.
    pub fn take(&mut self, number: u64) -> Option<Slot> {
        let index = self.index(number);
        if self.slots[index].as_ref()?.number != number {
            return None;
        }
        self.occupied -= 1;
        self.slots[index].take()
    }

    /// Free every slot.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.occupied = 0;
    }
}
