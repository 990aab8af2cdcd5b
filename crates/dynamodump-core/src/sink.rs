//! Batching object writer for backups.
//!
//! Records are encoded one per line into an in-memory buffer. The buffer is
//! written out as a data object whenever the next line would push it past
//! the size threshold, and once more at the end of the stream, so every
//! backup holds at least one data object even for an empty table. After the last
//! data object the sink writes the manifest and then the empty completion
//! marker. Nothing is written after an aborted stream or a failed put, so a
//! backup without a marker is never mistaken for a complete one.

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use dynamodump_model::{Manifest, encode_item};
use tracing::{debug, info};

use crate::backend::ObjectStore;
use crate::channel::RecordReceiver;
use crate::destination::Destination;
use crate::error::{DumpError, DumpResult};

/// Outcome of a completed backup sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    /// Records written.
    pub records: u64,
    /// Data object URLs in flush order, as listed in the manifest.
    pub objects: Vec<String>,
    /// Total bytes across data objects.
    pub bytes: u64,
    /// Manifest URL.
    pub manifest_url: String,
    /// Completion marker URL.
    pub marker_url: String,
}

/// Writes the record stream into size-bounded data objects.
#[derive(Debug)]
pub struct ObjectSink<S> {
    store: Arc<S>,
    destination: Destination,
    max_buffer_size: usize,
    buffer: BytesMut,
    manifest: Manifest,
    records: u64,
    bytes: u64,
}

impl<S: ObjectStore> ObjectSink<S> {
    /// Create a sink flushing at `max_buffer_size` bytes.
    #[must_use]
    pub fn new(store: Arc<S>, destination: Destination, max_buffer_size: usize) -> Self {
        Self {
            store,
            destination,
            max_buffer_size,
            buffer: BytesMut::new(),
            manifest: Manifest::new(),
            records: 0,
            bytes: 0,
        }
    }

    /// Consume the stream until it ends, then write manifest and marker.
    pub async fn run(mut self, mut receiver: RecordReceiver) -> DumpResult<SinkReport> {
        while let Some(item) = receiver.recv().await? {
            let line = encode_item(&item)?;
            if !self.buffer.is_empty() && self.buffer.len() + line.len() + 1 > self.max_buffer_size
            {
                self.flush().await?;
            }
            self.buffer.extend_from_slice(&line);
            self.buffer.put_u8(b'\n');
            self.records += 1;
        }

        self.flush().await?;

        let manifest = self.destination.manifest();
        let data = self.manifest.to_json().map_err(DumpError::ManifestEncode)?;
        self.store.put_object(&manifest, Bytes::from(data)).await?;

        let marker = self.destination.success_marker();
        self.store.put_object(&marker, Bytes::new()).await?;

        info!(
            destination = %self.destination,
            records = self.records,
            objects = self.manifest.len(),
            bytes = self.bytes,
            "backup written"
        );

        Ok(SinkReport {
            records: self.records,
            objects: self.manifest.entries.into_iter().map(|e| e.url).collect(),
            bytes: self.bytes,
            manifest_url: manifest.url(),
            marker_url: marker.url(),
        })
    }

    async fn flush(&mut self) -> DumpResult<()> {
        let location = self.destination.new_data_object();
        let data = self.buffer.split().freeze();
        let size = data.len();
        self.store.put_object(&location, data).await?;
        self.bytes += size as u64;
        debug!(url = %location, size, "flushed data object");
        self.manifest.push(location.url());
        Ok(())
    }
}
