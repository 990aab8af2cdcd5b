//! Backend abstractions.
//!
//! The pipeline only talks to a table and an object store through these two
//! traits, so the same code runs against AWS and against the in-memory
//! backends in [`crate::memory`].

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use dynamodump_model::{BatchPutOutput, Item, ScanPage, ScanRequest, TableError, TableSummary};
use tokio::io::AsyncBufRead;

use crate::destination::ObjectLocation;
use crate::error::ObjectStoreError;

/// Buffered reader over an object body.
pub type ObjectReader = Pin<Box<dyn AsyncBufRead + Send>>;

/// A key-value table that can be scanned page by page and written in batches.
#[async_trait]
pub trait TableBackend: Send + Sync + 'static {
    /// Fetch one page of a full-table scan.
    async fn scan_page(&self, request: &ScanRequest) -> Result<ScanPage, TableError>;

    /// Report status and approximate item count of a table.
    async fn describe_table(&self, table_name: &str) -> Result<TableSummary, TableError>;

    /// Put up to [`dynamodump_model::MAX_BATCH_WRITE_ITEMS`] items in one request.
    ///
    /// Items the backend did not apply are returned in
    /// [`BatchPutOutput::unprocessed_items`].
    async fn batch_put(&self, table_name: &str, items: &[Item])
    -> Result<BatchPutOutput, TableError>;
}

/// A bucketed object store.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Open an object for streaming reads.
    async fn get_object(&self, location: &ObjectLocation) -> Result<ObjectReader, ObjectStoreError>;

    /// Whether an object exists.
    async fn exists(&self, location: &ObjectLocation) -> Result<bool, ObjectStoreError>;

    /// Create or replace an object.
    async fn put_object(&self, location: &ObjectLocation, data: Bytes)
    -> Result<(), ObjectStoreError>;
}
