//! Paginated full-table scan feeding the record stream.

use std::sync::Arc;
use std::time::Duration;

use dynamodump_model::ScanRequest;
use tracing::{debug, info, warn};

use crate::backend::TableBackend;
use crate::channel::RecordSender;
use crate::error::DumpResult;

/// Counters of one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Pages received.
    pub pages: u64,
    /// Records forwarded to the stream.
    pub records: u64,
    /// Page requests rejected by throttling and retried.
    pub throttled: u64,
}

/// Reads a table page by page and forwards every item, in page order.
///
/// A throttled page request is retried with the same start key after twice
/// the pacing delay. Every other backend error ends the scan.
#[derive(Debug)]
pub struct TableScanner<T> {
    table: Arc<T>,
    table_name: String,
    page_size: Option<i32>,
    wait: Duration,
}

impl<T: TableBackend> TableScanner<T> {
    /// Create a scanner. `page_size` of `None` leaves paging to the backend.
    #[must_use]
    pub fn new(
        table: Arc<T>,
        table_name: impl Into<String>,
        page_size: Option<i32>,
        wait: Duration,
    ) -> Self {
        Self {
            table,
            table_name: table_name.into(),
            page_size,
            wait,
        }
    }

    /// Scan the whole table into `sender`, then close it.
    ///
    /// On error the sender is dropped without closing, so the consumer sees an
    /// aborted stream.
    pub async fn run(self, mut sender: RecordSender) -> DumpResult<ScanStats> {
        let mut stats = ScanStats::default();
        let mut request = ScanRequest {
            table_name: self.table_name.clone(),
            limit: self.page_size,
            exclusive_start_key: None,
        };

        loop {
            let page = match self.table.scan_page(&request).await {
                Ok(page) => page,
                Err(e) if e.is_throttling() => {
                    stats.throttled += 1;
                    warn!(
                        table = %self.table_name,
                        code = %e.code,
                        "scan throttled, retrying page"
                    );
                    tokio::time::sleep(self.wait * 2).await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            stats.pages += 1;
            info!(
                table = %self.table_name,
                page = stats.pages,
                items = page.items.len(),
                consumed_capacity = ?page.consumed_capacity,
                "scanned page"
            );

            for item in page.items {
                sender.send(item).await?;
                stats.records += 1;
            }

            tokio::time::sleep(self.wait).await;

            match page.last_evaluated_key {
                Some(key) => request.exclusive_start_key = Some(key),
                None => break,
            }
        }

        sender.close().await?;
        debug!(
            table = %self.table_name,
            pages = stats.pages,
            records = stats.records,
            "scan complete"
        );
        Ok(stats)
    }
}
