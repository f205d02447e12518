//! # Ordering Under Disorder
//!
//! Pages arrive as header and transaction events in a shuffled order. The
//! store must still see every block exactly once, in ascending order, with
//! its cursor write right behind it.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use li_01_ledger_store::{InMemoryKVStore, LedgerStore, CURSOR_KEY};
    use li_03_page_sync::test_utils::{FailureMode, MemorySource};
    use li_03_page_sync::{RecoveryDriver, SyncConfig, SyncOutcome};
    use tokio::sync::watch;

    use crate::integration::support::{block_writes, cursor_writes, RecordingStore};

    fn driver(source: &Arc<MemorySource>) -> (RecoveryDriver<MemorySource>, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        let driver = RecoveryDriver::new(Arc::clone(source), SyncConfig::for_testing(), rx);
        (driver, tx)
    }

    #[tokio::test]
    async fn test_shuffled_pages_commit_in_order() {
        let source = Arc::new(MemorySource::generate(137, 0xC0FFEE));
        let (driver, _tx) = driver(&source);
        let recorder = RecordingStore::new(InMemoryKVStore::new());
        let log = recorder.log();
        let mut store = LedgerStore::new(recorder);

        let outcome = driver.run(&mut store, 136).await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Completed {
                next_block: 137,
                committed: 137
            }
        );

        // Strictly ascending, no repeats, each block followed by its cursor.
        assert_eq!(block_writes(&log), (0..137).collect::<Vec<_>>());
        let keys = log.lock().clone();
        for pair in keys.chunks(2) {
            assert_ne!(pair[0].as_slice(), CURSOR_KEY);
            assert_eq!(pair[1].as_slice(), CURSOR_KEY);
        }
        assert_eq!(cursor_writes(&log), 137);

        for expected in source.blocks() {
            assert_eq!(store.get(expected.number).unwrap().as_ref(), Some(expected));
        }
        assert_eq!(store.cursor().unwrap(), Some(137));
    }

    #[tokio::test]
    async fn test_flaky_pages_still_commit_once_each() {
        let source = Arc::new(
            MemorySource::generate(60, 99)
                .with_failure(0, FailureMode::Error, 2)
                .with_failure(20, FailureMode::ErrorAfterHalf, 2)
                .with_failure(40, FailureMode::DropLastRecord, 1),
        );
        let (driver, _tx) = driver(&source);
        let recorder = RecordingStore::new(InMemoryKVStore::new());
        let log = recorder.log();
        let mut store = LedgerStore::new(recorder);

        let outcome = driver.run(&mut store, 59).await.unwrap();
        assert_eq!(outcome.next_block(), 60);
        assert_eq!(block_writes(&log), (0..60).collect::<Vec<_>>());

        let report = store.validate().unwrap();
        assert_eq!(report.blocks, 60);
        assert_eq!(
            report.transactions,
            source
                .blocks()
                .iter()
                .map(|b| b.transactions.len() as u64)
                .sum::<u64>()
        );
        // 6 pages, plus 2 + 2 + 1 retries
        assert_eq!(source.fetch_count(), 11);
    }

    #[tokio::test]
    async fn test_bad_transaction_index_stops_before_the_block() {
        let source =
            Arc::new(MemorySource::generate(30, 4).with_failure(10, FailureMode::BadIndex, 1));
        let (driver, _tx) = driver(&source);
        let mut store = LedgerStore::new(InMemoryKVStore::new());

        let err = driver.run(&mut store, 29).await.unwrap_err();
        assert!(err.is_integrity_violation(), "unexpected error: {err}");
        assert_eq!(store.cursor().unwrap(), Some(10));
        assert!(store.get(10).unwrap().is_none());
        assert_eq!(store.validate().unwrap().blocks, 10);
    }

    #[tokio::test]
    async fn test_exhausted_retries_keep_committed_prefix() {
        let source =
            Arc::new(MemorySource::generate(30, 8).with_failure(20, FailureMode::Error, 3));
        let (driver, _tx) = driver(&source);
        let mut store = LedgerStore::new(InMemoryKVStore::new());

        let err = driver.run(&mut store, 29).await.unwrap_err();
        assert!(!err.is_integrity_violation());
        assert_eq!(store.cursor().unwrap(), Some(20));
        assert_eq!(store.validate().unwrap().last_block, Some(19));
    }
}
