//! Paced batch writer for restores.
//!
//! Records are pulled from the stream into batches of at most
//! [`MAX_BATCH_WRITE_ITEMS`]. After every `batch_size` records the writer
//! sleeps for the pacing delay, and a batch is cut short when it would cross
//! that boundary. Unprocessed items and throttled requests are resubmitted
//! after twice the pacing delay until the table accepts them.

use std::sync::Arc;
use std::time::Duration;

use dynamodump_model::{Item, MAX_BATCH_WRITE_ITEMS};
use tracing::{debug, info, warn};

use crate::backend::TableBackend;
use crate::channel::RecordReceiver;
use crate::error::DumpResult;

/// Counters of one restore writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterReport {
    /// Records accepted by the table.
    pub records: u64,
    /// Batch put requests sent, retries included.
    pub requests: u64,
    /// Items returned as unprocessed and resubmitted.
    pub retried_items: u64,
    /// Requests rejected by throttling and resubmitted.
    pub throttled: u64,
    /// Pacing pauses taken.
    pub pauses: u64,
}

/// Writes the record stream into a table in paced batches.
#[derive(Debug)]
pub struct BatchTableWriter<T> {
    table: Arc<T>,
    table_name: String,
    batch_size: usize,
    wait: Duration,
}

impl<T: TableBackend> BatchTableWriter<T> {
    /// Create a writer pausing after every `batch_size` records.
    #[must_use]
    pub fn new(
        table: Arc<T>,
        table_name: impl Into<String>,
        batch_size: usize,
        wait: Duration,
    ) -> Self {
        Self {
            table,
            table_name: table_name.into(),
            batch_size: batch_size.max(1),
            wait,
        }
    }

    /// Consume the stream until it ends.
    pub async fn run(self, mut receiver: RecordReceiver) -> DumpResult<WriterReport> {
        let mut report = WriterReport::default();
        let mut since_pause = 0usize;

        loop {
            let batch = self.next_batch(&mut receiver, since_pause).await?;
            if batch.is_empty() {
                break;
            }
            let size = batch.len();
            self.submit(batch, &mut report).await?;
            report.records += size as u64;
            since_pause += size;

            if since_pause >= self.batch_size {
                debug!(table = %self.table_name, records = report.records, "pausing writes");
                tokio::time::sleep(self.wait).await;
                report.pauses += 1;
                since_pause = 0;
            }
        }

        info!(
            table = %self.table_name,
            records = report.records,
            requests = report.requests,
            retried_items = report.retried_items,
            "restore written"
        );
        Ok(report)
    }

    async fn next_batch(
        &self,
        receiver: &mut RecordReceiver,
        since_pause: usize,
    ) -> DumpResult<Vec<Item>> {
        let mut batch = Vec::with_capacity(MAX_BATCH_WRITE_ITEMS);
        while let Some(item) = receiver.recv().await? {
            batch.push(item);
            if batch.len() >= MAX_BATCH_WRITE_ITEMS
                || since_pause + batch.len() >= self.batch_size
            {
                break;
            }
        }
        Ok(batch)
    }

    async fn submit(&self, batch: Vec<Item>, report: &mut WriterReport) -> DumpResult<()> {
        let retry_wait = self.wait * 2;
        let mut pending = batch;

        loop {
            report.requests += 1;
            match self.table.batch_put(&self.table_name, &pending).await {
                Ok(output) => {
                    debug!(
                        table = %self.table_name,
                        items = pending.len(),
                        unprocessed = output.unprocessed_items.len(),
                        consumed_capacity = ?output.consumed_capacity,
                        "batch written"
                    );
                    if output.unprocessed_items.is_empty() {
                        return Ok(());
                    }
                    report.retried_items += output.unprocessed_items.len() as u64;
                    warn!(
                        table = %self.table_name,
                        unprocessed = output.unprocessed_items.len(),
                        "resubmitting unprocessed items"
                    );
                    pending = output.unprocessed_items;
                }
                Err(e) if e.is_throttling() => {
                    report.throttled += 1;
                    warn!(
                        table = %self.table_name,
                        code = %e.code,
                        items = pending.len(),
                        "batch throttled, resubmitting"
                    );
                }
                Err(e) => return Err(e.into()),
            }
            tokio::time::sleep(retry_wait).await;
        }
    }
}
