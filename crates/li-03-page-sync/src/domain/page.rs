//! Page ranges.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open range of block numbers `[start, end)` fetched as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u64,
    pub end: u64,
}

impl PageRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// The page beginning at `start`: at most `page_size` blocks, never
    /// past `last_block` (inclusive).
    pub fn starting_at(start: u64, page_size: usize, last_block: u64) -> Self {
        let end = start
            .saturating_add(page_size as u64)
            .min(last_block.saturating_add(1));
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, number: u64) -> bool {
        (self.start..self.end).contains(&number)
    }

    /// Block numbers in the page.
    pub fn numbers(&self) -> std::ops::Range<u64> {
        self.start..self.end
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
