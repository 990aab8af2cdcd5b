//! End-to-end backups and restores over the in-memory backends.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dynamodump_core::destination::{Destination, ObjectLocation};
    use dynamodump_core::memory::{MemoryObjectStore, MemoryTable};
    use dynamodump_core::{Action, DumpConfig, DumpError, Pipeline};
    use dynamodump_model::{Manifest, decode_item};

    use crate::{init_tracing, sample_item};

    fn config(action: Action) -> DumpConfig {
        DumpConfig::builder()
            .action(action)
            .table_name("users")
            .bucket("backups")
            .folder("users")
            .wait_ms(0)
            .build()
    }

    fn table_with(count: u32) -> Arc<MemoryTable> {
        let table = MemoryTable::new("users", "pk");
        for n in 0..count {
            table
                .insert(sample_item(n))
                .unwrap_or_else(|e| panic!("failed to seed table: {e}"));
        }
        Arc::new(table)
    }

    #[tokio::test]
    async fn test_should_write_one_object_per_record_and_restore_in_order() {
        init_tracing();
        let store = Arc::new(MemoryObjectStore::new());
        let source = table_with(3);

        let mut backup = config(Action::Backup);
        backup.buffer_size = 1;
        let report = Pipeline::new(Arc::clone(&source), Arc::clone(&store), backup)
            .backup()
            .await
            .unwrap();

        assert_eq!(report.sink.objects.len(), 3);
        let mut keys = store.keys("backups");
        keys.retain(|k| k != "users/manifest" && k != "users/_SUCCESS");
        assert_eq!(keys.len(), 3);

        let manifest = store
            .get(&ObjectLocation::new("backups", "users/manifest"))
            .unwrap();
        let manifest = Manifest::from_json(&manifest).unwrap();
        assert_eq!(manifest.name, "DynamoDB-export");
        assert_eq!(manifest.version, 3);
        for (n, entry) in manifest.entries.iter().enumerate() {
            let data = store
                .get(&ObjectLocation::from_url(&entry.url).unwrap())
                .unwrap();
            assert_eq!(data.iter().filter(|b| **b == b'\n').count(), 1);
            let record = decode_item(&data[..data.len() - 1]).unwrap();
            assert_eq!(record, sample_item(u32::try_from(n).unwrap()));
        }

        let target = Arc::new(MemoryTable::new("users", "pk"));
        let restored = Pipeline::new(Arc::clone(&target), store, config(Action::Restore))
            .restore()
            .await
            .unwrap();
        assert_eq!(restored.writer.records, 3);
        assert_eq!(target.items(), source.items());
    }

    #[tokio::test]
    async fn test_should_survive_throttling_and_partial_writes() {
        init_tracing();
        let store = Arc::new(MemoryObjectStore::new());
        let source = table_with(120);
        source.throttle_scans(2);

        let mut backup = config(Action::Backup);
        backup.batch_size = 40;
        backup.buffer_size = 4096;
        let report = Pipeline::new(Arc::clone(&source), Arc::clone(&store), backup)
            .backup()
            .await
            .unwrap();
        assert_eq!(report.scan.pages, 3);
        assert_eq!(report.scan.throttled, 2);
        assert_eq!(report.sink.records, 120);

        let target = Arc::new(MemoryTable::new("users", "pk"));
        target.throttle_writes(3);
        target.limit_items_per_batch(7);
        let mut restore = config(Action::Restore);
        restore.batch_size = 30;
        let report = Pipeline::new(Arc::clone(&target), store, restore)
            .restore()
            .await
            .unwrap();

        assert_eq!(report.writer.records, 120);
        assert_eq!(report.writer.throttled, 3);
        assert!(report.writer.retried_items > 0);
        assert_eq!(report.writer.pauses, 4);
        assert!(target.batch_sizes().iter().all(|size| *size <= 25));
        assert_eq!(target.items(), source.items());
    }

    #[tokio::test]
    async fn test_should_restore_from_dated_folder() {
        init_tracing();
        let store = Arc::new(MemoryObjectStore::new());
        let source = table_with(10);

        let mut backup = config(Action::Backup);
        backup.date_folder = true;
        let report = Pipeline::new(Arc::clone(&source), Arc::clone(&store), backup)
            .backup()
            .await
            .unwrap();

        let folder = report
            .destination
            .strip_prefix("s3://backups/")
            .unwrap()
            .to_owned();
        assert!(folder.starts_with("users/20"));
        assert_eq!(folder.len(), "users/".len() + "YYYY-MM-DD-HH-MM-SS".len());

        let undated = Destination::new("backups", "users");
        assert!(store.get(&undated.success_marker()).is_none());

        let target = Arc::new(MemoryTable::new("users", "pk"));
        let mut restore = config(Action::Restore);
        restore.folder = folder;
        Pipeline::new(Arc::clone(&target), store, restore)
            .restore()
            .await
            .unwrap();
        assert_eq!(target.len(), 10);
    }

    #[tokio::test]
    async fn test_should_guard_non_empty_target_unless_appending() {
        init_tracing();
        let store = Arc::new(MemoryObjectStore::new());
        let source = table_with(5);
        Pipeline::new(Arc::clone(&source), Arc::clone(&store), config(Action::Backup))
            .backup()
            .await
            .unwrap();

        let err = Pipeline::new(Arc::clone(&source), Arc::clone(&store), config(Action::Restore))
            .restore()
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::TableNotEmpty { count: 5, .. }));
        assert!(source.batch_sizes().is_empty());

        let mut append = config(Action::Restore);
        append.restore_append = true;
        let report = Pipeline::new(Arc::clone(&source), store, append)
            .restore()
            .await
            .unwrap();
        assert_eq!(report.writer.records, 5);
        assert_eq!(source.len(), 5);
    }

    #[tokio::test]
    async fn test_should_not_restore_interrupted_backup() {
        init_tracing();
        let store = Arc::new(MemoryObjectStore::new());
        let source = table_with(50);
        store.fail_puts_after(2);

        let mut backup = config(Action::Backup);
        backup.buffer_size = 512;
        let err = Pipeline::new(Arc::clone(&source), Arc::clone(&store), backup)
            .backup()
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::ObjectStore(_)));
        assert_eq!(store.keys("backups").len(), 2);

        let target = Arc::new(MemoryTable::new("users", "pk"));
        let err = Pipeline::new(Arc::clone(&target), store, config(Action::Restore))
            .restore()
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::MissingCompletionMarker { .. }));
        assert!(target.is_empty());
    }
}
