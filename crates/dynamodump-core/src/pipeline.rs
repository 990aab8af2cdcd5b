//! Run coordinator.
//!
//! A [`Pipeline`] owns the two backends and the run settings. Each run spawns
//! a producer task and a consumer task joined by a record channel and waits
//! for both. When one side fails the other one stops with a disconnect error,
//! so the coordinator reports the error that actually caused the failure.

use std::sync::Arc;

use chrono::Utc;
use dynamodump_model::TableSummary;
use tracing::info;

use crate::backend::{ObjectStore, TableBackend};
use crate::channel::record_channel;
use crate::config::{Action, DumpConfig};
use crate::error::{DumpError, DumpResult};
use crate::preflight::check_table_state;
use crate::scanner::{ScanStats, TableScanner};
use crate::sink::{ObjectSink, SinkReport};
use crate::source::{ObjectSource, SourceReport, open_backup};
use crate::writer::{BatchTableWriter, WriterReport};

/// Outcome of a successful backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    /// `s3://bucket/prefix` the backup was written to.
    pub destination: String,
    /// Scanner counters.
    pub scan: ScanStats,
    /// Sink outcome.
    pub sink: SinkReport,
}

/// Outcome of a successful restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// Target table state before the restore.
    pub table: TableSummary,
    /// Source counters.
    pub source: SourceReport,
    /// Writer counters.
    pub writer: WriterReport,
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// A backup completed.
    Backup(BackupReport),
    /// A restore completed.
    Restore(RestoreReport),
}

/// Backends and settings of a run.
#[derive(Debug)]
pub struct Pipeline<T, S> {
    table: Arc<T>,
    store: Arc<S>,
    config: DumpConfig,
}

impl<T: TableBackend, S: ObjectStore> Pipeline<T, S> {
    /// Create a pipeline.
    #[must_use]
    pub fn new(table: Arc<T>, store: Arc<S>, config: DumpConfig) -> Self {
        Self {
            table,
            store,
            config,
        }
    }

    /// Run settings.
    #[must_use]
    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Run the configured action.
    pub async fn run(&self) -> DumpResult<RunReport> {
        match self.config.action {
            Action::Backup => self.backup().await.map(RunReport::Backup),
            Action::Restore => self.restore().await.map(RunReport::Restore),
        }
    }

    /// Copy the table into a new backup.
    pub async fn backup(&self) -> DumpResult<BackupReport> {
        self.config.validate()?;
        let destination = self.config.backup_destination(Utc::now());
        info!(
            table = %self.config.table_name,
            destination = %destination,
            "starting backup"
        );

        let (sender, receiver) = record_channel();
        let scanner = TableScanner::new(
            Arc::clone(&self.table),
            self.config.table_name.clone(),
            self.config.scan_limit(),
            self.config.wait(),
        );
        let sink = ObjectSink::new(
            Arc::clone(&self.store),
            destination.clone(),
            self.config.buffer_size,
        );

        let consumer = tokio::spawn(sink.run(receiver));
        let producer = tokio::spawn(scanner.run(sender));
        let (produced, consumed) = tokio::join!(producer, consumer);
        let (scan, sink) = settle(produced?, consumed?)?;

        Ok(BackupReport {
            destination: destination.to_string(),
            scan,
            sink,
        })
    }

    /// Load a completed backup into the table.
    pub async fn restore(&self) -> DumpResult<RestoreReport> {
        self.config.validate()?;
        let destination = self.config.restore_destination();
        info!(
            table = %self.config.table_name,
            source = %destination,
            append = self.config.restore_append,
            "starting restore"
        );

        let table = check_table_state(
            self.table.as_ref(),
            &self.config.table_name,
            self.config.restore_append,
        )
        .await?;
        let manifest = open_backup(self.store.as_ref(), &destination).await?;

        let (sender, receiver) = record_channel();
        let source = ObjectSource::new(Arc::clone(&self.store), manifest);
        let writer = BatchTableWriter::new(
            Arc::clone(&self.table),
            self.config.table_name.clone(),
            usize::try_from(self.config.batch_size).unwrap_or(usize::MAX),
            self.config.wait(),
        );

        let consumer = tokio::spawn(writer.run(receiver));
        let producer = tokio::spawn(source.run(sender));
        let (produced, consumed) = tokio::join!(producer, consumer);
        let (source, writer) = settle(produced?, consumed?)?;

        Ok(RestoreReport {
            table,
            source,
            writer,
        })
    }
}

/// Combine the results of both tasks, keeping the root cause of a failure.
fn settle<P, C>(produced: DumpResult<P>, consumed: DumpResult<C>) -> DumpResult<(P, C)> {
    match (produced, consumed) {
        (Ok(p), Ok(c)) => Ok((p, c)),
        (Err(DumpError::ConsumerGone), Err(e)) | (Err(e), Err(DumpError::ProducerAborted)) => {
            Err(e)
        }
        (Err(e), _) | (_, Err(e)) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use dynamodump_model::{
        AttributeValue, Item, Manifest, TableErrorCode, encode_item, table_error,
    };

    use super::*;
    use crate::destination::{Destination, ObjectLocation};
    use crate::memory::{MemoryObjectStore, MemoryTable};

    fn item(n: u32) -> Item {
        let mut item = Item::new();
        item.insert("pk".to_owned(), AttributeValue::N(n.to_string()));
        item.insert("name".to_owned(), AttributeValue::S(format!("user {n}")));
        item
    }

    fn config(action: Action) -> DumpConfig {
        DumpConfig::builder()
            .action(action)
            .table_name("users")
            .bucket("backups")
            .folder("nightly")
            .wait_ms(0)
            .buffer_size(256)
            .build()
    }

    fn source_table(count: u32) -> Arc<MemoryTable> {
        let table = MemoryTable::new("users", "pk");
        for n in 0..count {
            table.insert(item(n)).unwrap();
        }
        Arc::new(table)
    }

    #[test]
    fn test_should_prefer_root_cause() {
        let result: DumpResult<((), ())> =
            settle(Err(DumpError::ConsumerGone), Err(table_error!(InternalServerError).into()));
        assert!(matches!(result, Err(DumpError::Table(_))));

        let result: DumpResult<((), ())> =
            settle(Err(table_error!(ThrottlingException).into()), Err(DumpError::ProducerAborted));
        assert!(matches!(result, Err(DumpError::Table(_))));

        let result: DumpResult<((), ())> = settle(Ok(()), Err(DumpError::ConsumerGone));
        assert!(matches!(result, Err(DumpError::ConsumerGone)));
    }

    #[tokio::test]
    async fn test_should_backup_and_restore_table() {
        let store = Arc::new(MemoryObjectStore::new());
        let source = source_table(40);
        let backup = Pipeline::new(Arc::clone(&source), Arc::clone(&store), config(Action::Backup));
        let report = match backup.run().await.unwrap() {
            RunReport::Backup(report) => report,
            other => panic!("expected backup report, got {other:?}"),
        };
        assert_eq!(report.destination, "s3://backups/nightly");
        assert_eq!(report.scan.records, 40);
        assert_eq!(report.sink.records, 40);
        assert!(report.sink.objects.len() > 1);

        let target = Arc::new(MemoryTable::new("users", "pk"));
        let restore = Pipeline::new(Arc::clone(&target), store, config(Action::Restore));
        let report = restore.restore().await.unwrap();
        assert_eq!(report.source.records, 40);
        assert_eq!(report.writer.records, 40);
        assert_eq!(target.items(), source.items());
    }

    #[tokio::test]
    async fn test_should_leave_no_marker_when_scan_fails() {
        let store = Arc::new(MemoryObjectStore::new());
        let source = source_table(10);
        source.fail_scans_after(1, TableErrorCode::AccessDeniedException);
        let mut config = config(Action::Backup);
        config.batch_size = 3;

        let err = Pipeline::new(source, Arc::clone(&store), config)
            .backup()
            .await
            .unwrap_err();
        match err {
            DumpError::Table(e) => assert_eq!(e.code, TableErrorCode::AccessDeniedException),
            other => panic!("expected table error, got {other:?}"),
        }
        let dest = Destination::new("backups", "nightly");
        assert!(store.get(&dest.success_marker()).is_none());
        assert!(store.get(&dest.manifest()).is_none());
    }

    #[tokio::test]
    async fn test_should_report_object_store_failure_during_backup() {
        let store = Arc::new(MemoryObjectStore::new());
        store.fail_puts_after(0);
        let err = Pipeline::new(source_table(10), store, config(Action::Backup))
            .backup()
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::ObjectStore(_)));
    }

    #[tokio::test]
    async fn test_should_refuse_restore_into_non_empty_table() {
        let store = Arc::new(MemoryObjectStore::new());
        let target = source_table(5);
        let err = Pipeline::new(target, store, config(Action::Restore))
            .restore()
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::TableNotEmpty { count: 5, .. }));
    }

    #[tokio::test]
    async fn test_should_refuse_restore_without_marker() {
        let store = Arc::new(MemoryObjectStore::new());
        let dest = Destination::new("backups", "nightly");
        store.insert(dest.manifest(), Manifest::new().to_json().unwrap());

        let target = Arc::new(MemoryTable::new("users", "pk"));
        let err = Pipeline::new(Arc::clone(&target), store, config(Action::Restore))
            .restore()
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::MissingCompletionMarker { .. }));
        assert!(target.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_should_append_when_allowed() {
        let store = Arc::new(MemoryObjectStore::new());
        let dest = Destination::new("backups", "nightly");
        let mut manifest = Manifest::new();
        let object = ObjectLocation::new("backups", "nightly/data");
        manifest.push(object.url());
        let mut line = encode_item(&item(99)).unwrap();
        line.push(b'\n');
        store.insert(object, line);
        store.insert(dest.manifest(), manifest.to_json().unwrap());
        store.insert(dest.success_marker(), Bytes::new());

        let target = source_table(2);
        let mut config = config(Action::Restore);
        config.restore_append = true;
        let report = Pipeline::new(Arc::clone(&target), store, config)
            .restore()
            .await
            .unwrap();
        assert_eq!(report.table.item_count, 2);
        assert_eq!(report.writer.records, 1);
        assert_eq!(report.source.malformed_lines, 0);
        assert_eq!(target.len(), 3);
        assert!(target.items().contains(&item(99)));
    }

    #[tokio::test]
    async fn test_should_reject_invalid_config_before_touching_backends() {
        let store = Arc::new(MemoryObjectStore::new());
        let mut config = config(Action::Backup);
        config.bucket = String::new();
        let err = Pipeline::new(source_table(1), Arc::clone(&store), config)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::Config(_)));
        assert!(store.put_log().is_empty());
    }
}
