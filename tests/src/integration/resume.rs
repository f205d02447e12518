//! # Restart Semantics
//!
//! A run can stop anywhere: cleanly, on cancellation, or between a block
//! write and its cursor write. Restarting with the same arguments must end
//! in the same store, re-committing at most the one block whose cursor
//! write was lost.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use li_01_ledger_store::test_utils::make_block;
    use li_01_ledger_store::{InMemoryKVStore, LedgerStore};
    use li_03_page_sync::test_utils::{FailureMode, MemorySource};
    use li_03_page_sync::{plan_resume, RecoveryDriver, SyncConfig, SyncOutcome};
    use tokio::sync::watch;

    use crate::integration::support::{block_writes, snapshot, RecordingStore};

    fn driver(source: &Arc<MemorySource>) -> (RecoveryDriver<MemorySource>, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        let driver = RecoveryDriver::new(Arc::clone(source), SyncConfig::for_testing(), rx);
        (driver, tx)
    }

    #[tokio::test]
    async fn test_rerun_after_completion_writes_nothing() {
        let source = Arc::new(MemorySource::generate(50, 12));
        let (driver, _tx) = driver(&source);
        let mut store = LedgerStore::new(InMemoryKVStore::new());
        driver.run(&mut store, 49).await.unwrap();
        let before = snapshot(store.inner());

        let recorder = RecordingStore::new(store.into_inner());
        let log = recorder.log();
        let mut store = LedgerStore::new(recorder);
        let outcome = driver.run(&mut store, 49).await.unwrap();

        assert_eq!(outcome, SyncOutcome::UpToDate { next_block: 50 });
        assert!(log.lock().is_empty());
        assert_eq!(snapshot(store.inner()), before);
        assert_eq!(source.fetch_count(), 5);
    }

    #[tokio::test]
    async fn test_crash_before_cursor_write_recommits_one_block() {
        let source = Arc::new(MemorySource::generate(50, 21));
        let (driver, _tx) = driver(&source);

        let recorder = RecordingStore::new(InMemoryKVStore::new()).crash_after(23);
        let first_log = recorder.log();
        let mut store = LedgerStore::new(recorder);
        assert!(driver.run(&mut store, 49).await.is_err());

        // Block 23 landed, its cursor write did not.
        assert_eq!(block_writes(&first_log), (0..24).collect::<Vec<_>>());
        let store = store.into_inner().into_inner();

        let recorder = RecordingStore::new(store);
        let second_log = recorder.log();
        let mut store = LedgerStore::new(recorder);
        let plan = plan_resume(&store).unwrap();
        assert_eq!(plan.next_block, 23);
        assert_eq!(plan.replay_range(), Some(23..24));

        let outcome = driver.run(&mut store, 49).await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Completed {
                next_block: 50,
                committed: 27
            }
        );
        assert_eq!(block_writes(&second_log), (23..50).collect::<Vec<_>>());
        assert_eq!(store.validate().unwrap().blocks, 50);
        for expected in source.blocks() {
            assert_eq!(store.get(expected.number).unwrap().as_ref(), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_cancelled_run_resumes_where_it_stopped() {
        let source =
            Arc::new(MemorySource::generate(50, 33).with_failure(20, FailureMode::Stall, 1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stoppable =
            RecoveryDriver::new(Arc::clone(&source), SyncConfig::for_testing(), shutdown_rx);
        let mut store = LedgerStore::new(InMemoryKVStore::new());

        let stop = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            shutdown_tx.send(true).unwrap();
        };
        let (outcome, ()) = tokio::join!(stoppable.run(&mut store, 49), stop);
        let outcome = outcome.unwrap();

        let stopped_at = match outcome {
            SyncOutcome::Cancelled { next_block, .. } => next_block,
            other => panic!("expected cancellation, got {other:?}"),
        };
        assert!(stopped_at < 30);
        assert_eq!(store.cursor().unwrap(), Some(stopped_at));

        let (driver, _tx) = driver(&source);
        let outcome = driver.run(&mut store, 49).await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Completed {
                next_block: 50,
                committed: 50 - stopped_at
            }
        );
        assert_eq!(store.validate().unwrap().blocks, 50);
    }

    #[tokio::test]
    async fn test_lagging_cursor_replays_stored_blocks() {
        let source = Arc::new(MemorySource::generate(20, 5));
        let mut store = LedgerStore::new(InMemoryKVStore::new());
        for block in &source.blocks()[..10] {
            store.put(block).unwrap();
        }
        store.store_cursor(6).unwrap();

        let plan = plan_resume(&store).unwrap();
        assert_eq!(plan.replay_range(), Some(6..10));

        let (driver, _tx) = driver(&source);
        let outcome = driver.run(&mut store, 19).await.unwrap();
        assert_eq!(outcome.committed(), 14);
        assert_eq!(store.cursor().unwrap(), Some(20));
        assert_eq!(store.validate().unwrap().blocks, 20);
    }

    #[tokio::test]
    async fn test_cursor_past_stored_blocks_is_corrupt() {
        let source = Arc::new(MemorySource::generate(20, 5));
        let mut store = LedgerStore::new(InMemoryKVStore::new());
        for n in 0..5 {
            store.put(&make_block(n, 1)).unwrap();
        }
        store.store_cursor(9).unwrap();

        let (driver, _tx) = driver(&source);
        let err = driver.run(&mut store, 19).await.unwrap_err();
        assert!(err.is_integrity_violation());
        assert_eq!(store.cursor().unwrap(), Some(9));
    }

    #[tokio::test]
    async fn test_target_behind_cursor_is_up_to_date() {
        let source = Arc::new(MemorySource::generate(30, 2));
        let (driver, _tx) = driver(&source);
        let mut store = LedgerStore::new(InMemoryKVStore::new());
        driver.run(&mut store, 29).await.unwrap();

        let outcome = driver.run(&mut store, 10).await.unwrap();
        assert_eq!(outcome, SyncOutcome::UpToDate { next_block: 30 });
    }
}
