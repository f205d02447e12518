//! Assembly configuration.

use serde::{Deserialize, Serialize};

use super::errors::AssemblyError;

/// Configuration for the pending window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Number of block numbers that may be buffered at once, starting at
    /// the cursor. The page scheduler sets this to its page size.
    pub window_size: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self { window_size: 1000 }
    }
}

impl AssemblyConfig {
    /// Create a config with a specific window.
    pub fn with_window(window_size: usize) -> Self {
        Self { window_size }
    }

    /// Reject a window that cannot hold a single block.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.window_size == 0 {
            return Err(AssemblyError::InvalidConfig("window_size must be at least 1"));
        }
        Ok(())
    }
}
