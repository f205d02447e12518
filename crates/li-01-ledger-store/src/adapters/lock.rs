//! # Writer Lock
//!
//! One writer per data directory, enforced with an `fs2` exclusive lock on
//! `ledger.lock`. Read-only handles never take it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::domain::errors::KVStoreError;

/// Held by a writable store for its whole lifetime; released on drop.
pub struct WriterLock {
    file: File,
    path: PathBuf,
}

impl WriterLock {
    const LOCK_FILE: &'static str = "ledger.lock";

    /// Take the directory's writer lock and record our pid in it.
    ///
    /// Fails with `KVStoreError::Locked` naming the holder's pid when
    /// another handle, in this process or another, already holds it.
    pub fn acquire(data_dir: &Path) -> Result<Self, KVStoreError> {
        let path = data_dir.join(Self::LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(KVStoreError::io)?;

        if file.try_lock_exclusive().is_err() {
            let holder = std::fs::read_to_string(&path)
                .ok()
                .and_then(|s| s.trim().parse().ok());
            return Err(KVStoreError::Locked { pid: holder, path });
        }

        file.set_len(0).map_err(KVStoreError::io)?;
        writeln!(file, "{}", std::process::id()).map_err(KVStoreError::io)?;
        file.sync_all().map_err(KVStoreError::io)?;

        debug!("[li-01] Writer lock taken on {}", path.display());
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        if FileExt::unlock(&self.file).is_ok() {
            debug!("[li-01] Writer lock released on {}", self.path.display());
        }
    }
}
