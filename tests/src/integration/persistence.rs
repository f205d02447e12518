//! # Persistence End to End
//!
//! The file-backed store across process-like restarts, and the runtime's
//! context and read-only commands on top of it.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ingest_runtime::commands;
    use ingest_runtime::container::{IngestConfig, PipelineContext};
    use li_01_ledger_store::{FileBackedKVStore, LedgerStore};
    use li_03_page_sync::test_utils::{FailureMode, MemorySource};
    use li_03_page_sync::{plan_resume, RecoveryDriver, SyncConfig, SyncOutcome};
    use tokio::sync::watch;

    #[tokio::test]
    async fn test_file_store_resumes_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(MemorySource::generate(60, 77));
        let (_tx, rx) = watch::channel(false);
        let driver = RecoveryDriver::new(Arc::clone(&source), SyncConfig::for_testing(), rx);

        {
            let mut store = LedgerStore::new(FileBackedKVStore::open(dir.path(), false).unwrap());
            let outcome = driver.run(&mut store, 24).await.unwrap();
            assert_eq!(outcome.next_block(), 25);
        }

        let mut store = LedgerStore::new(FileBackedKVStore::open(dir.path(), false).unwrap());
        assert_eq!(plan_resume(&store).unwrap().next_block, 25);
        let outcome = driver.run(&mut store, 59).await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Completed {
                next_block: 60,
                committed: 35
            }
        );
        drop(store);

        let reader = LedgerStore::new(FileBackedKVStore::open_read_only(dir.path()).unwrap());
        for (expected, stored) in source.blocks().iter().zip(reader.range_from(0).unwrap()) {
            let (number, block) = stored.unwrap();
            assert_eq!(number, expected.number);
            assert_eq!(&block, expected);
        }
        assert_eq!(reader.validate().unwrap().blocks, 60);
    }

    #[tokio::test]
    async fn test_partial_page_failure_with_synced_writes() {
        let dir = tempfile::tempdir().unwrap();
        let source =
            Arc::new(MemorySource::generate(30, 3).with_failure(10, FailureMode::ErrorAfterHalf, 1));
        let (_tx, rx) = watch::channel(false);
        let driver = RecoveryDriver::new(Arc::clone(&source), SyncConfig::for_testing(), rx);

        let mut store = LedgerStore::new(FileBackedKVStore::open(dir.path(), true).unwrap());
        driver.run(&mut store, 29).await.unwrap();
        drop(store);

        let reader = LedgerStore::new(FileBackedKVStore::open_read_only(dir.path()).unwrap());
        assert_eq!(reader.cursor().unwrap(), Some(30));
        assert_eq!(reader.validate().unwrap().blocks, 30);
    }

    #[tokio::test]
    async fn test_runtime_sync_then_inspect() {
        let dir = tempfile::tempdir().unwrap();
        let config = IngestConfig::for_testing(dir.path());

        {
            let (_tx, rx) = watch::channel(false);
            let mut ctx = PipelineContext::build(config.clone(), rx).unwrap();
            let outcome = ctx.sync(None).await.unwrap();
            assert_eq!(outcome.next_block(), config.source.synthetic_blocks);
        }

        let report = commands::validate(&config.storage, 0).unwrap();
        assert_eq!(report.blocks, config.source.synthetic_blocks);

        let status = commands::status(&config.storage).unwrap();
        assert_eq!(status.resume_point, config.source.synthetic_blocks);
        assert_eq!(status.highest_block, Some(config.source.synthetic_blocks - 1));

        let (_tx, rx) = watch::channel(false);
        let mut ctx = PipelineContext::build(config.clone(), rx).unwrap();
        let outcome = ctx.sync(None).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::UpToDate { .. }));
    }

    #[tokio::test]
    async fn test_runtime_retries_flaky_synthetic_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = IngestConfig::for_testing(dir.path());
        config.source.failure_rate = 0.3;
        config.sync.max_page_attempts = 12;

        let (_tx, rx) = watch::channel(false);
        let mut ctx = PipelineContext::build(config.clone(), rx).unwrap();
        let outcome = ctx.sync(Some(39)).await.unwrap();
        assert_eq!(outcome.committed(), 40);
        assert_eq!(ctx.store.validate().unwrap().blocks, 40);
    }

    #[test]
    fn test_second_writer_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = IngestConfig::for_testing(dir.path());

        let (_tx, rx) = watch::channel(false);
        let _writer = PipelineContext::build(config.clone(), rx.clone()).unwrap();
        assert!(PipelineContext::build(config.clone(), rx).is_err());

        // Readers do not take the lock.
        assert!(commands::status(&config.storage).is_ok());
    }
}
