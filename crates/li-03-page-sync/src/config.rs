//! # Sync Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::SyncError;

/// Page scheduling and retry settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Block numbers per page. Also the reassembly window, so at most this
    /// many blocks are buffered at once.
    pub page_size: usize,

    /// Fetch attempts per page before the run fails.
    pub max_page_attempts: u32,

    /// Delay before the first retry; doubles on each further retry.
    pub retry_backoff_ms: u64,

    /// Upper bound on the retry delay.
    pub max_backoff_ms: u64,

    /// Capacity of the inbound event queue.
    pub queue_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            max_page_attempts: 5,
            retry_backoff_ms: 500,
            max_backoff_ms: 30_000,
            queue_capacity: 4096,
        }
    }
}

impl SyncConfig {
    /// Create a config for testing (small pages, no real waiting).
    pub fn for_testing() -> Self {
        Self {
            page_size: 10,
            max_page_attempts: 3,
            retry_backoff_ms: 1,
            max_backoff_ms: 5,
            queue_capacity: 16,
        }
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.page_size == 0 {
            return Err(SyncError::InvalidConfig("page_size must be at least 1".into()));
        }
        if self.max_page_attempts == 0 {
            return Err(SyncError::InvalidConfig(
                "max_page_attempts must be at least 1".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(SyncError::InvalidConfig(
                "queue_capacity must be at least 1".into(),
            ));
        }
        if self.retry_backoff_ms > self.max_backoff_ms {
            return Err(SyncError::InvalidConfig(format!(
                "retry_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.retry_backoff_ms, self.max_backoff_ms
            )));
        }
        Ok(())
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(20);
        let ms = self
            .retry_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}
