//! Manifest-driven object reader for restores.
//!
//! [`open_backup`] refuses a backup that has no completion marker and loads
//! its manifest. [`ObjectSource`] then streams every listed object line by
//! line, in manifest order, decoding one record per line. Lines that do not
//! decode are logged and skipped; everything else that goes wrong ends the
//! restore.

use std::sync::Arc;

use dynamodump_model::{Manifest, decode_item};
use tokio::io::{AsyncBufReadExt, AsyncReadExt};
use tracing::{debug, info, warn};

use crate::backend::ObjectStore;
use crate::channel::RecordSender;
use crate::destination::{Destination, ObjectLocation};
use crate::error::{DumpError, DumpResult, ObjectStoreError};

/// Check the completion marker of a backup and load its manifest.
pub async fn open_backup<S: ObjectStore>(
    store: &S,
    destination: &Destination,
) -> DumpResult<Manifest> {
    let marker = destination.success_marker();
    if !store.exists(&marker).await? {
        return Err(DumpError::MissingCompletionMarker { url: marker.url() });
    }

    let location = destination.manifest();
    let data = match read_object(store, &location).await {
        Ok(data) => data,
        Err(ObjectStoreError::NotFound { url }) => return Err(DumpError::ManifestMissing { url }),
        Err(e) => return Err(e.into()),
    };
    let manifest = Manifest::from_json(&data).map_err(|source| DumpError::ManifestCorrupt {
        url: location.url(),
        source,
    })?;

    info!(
        manifest = %location,
        entries = manifest.len(),
        "loaded backup manifest"
    );
    Ok(manifest)
}

async fn read_object<S: ObjectStore>(
    store: &S,
    location: &ObjectLocation,
) -> Result<Vec<u8>, ObjectStoreError> {
    let mut reader = store.get_object(location).await?;
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .await
        .map_err(|source| ObjectStoreError::Read {
            url: location.url(),
            source,
        })?;
    Ok(data)
}

/// Counters of one restore source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceReport {
    /// Objects read.
    pub objects: u64,
    /// Manifest entries skipped for an unsupported scheme.
    pub skipped_entries: u64,
    /// Records forwarded to the stream.
    pub records: u64,
    /// Lines that did not decode and were skipped.
    pub malformed_lines: u64,
}

/// Streams the records of every object listed in a manifest.
#[derive(Debug)]
pub struct ObjectSource<S> {
    store: Arc<S>,
    manifest: Manifest,
}

impl<S: ObjectStore> ObjectSource<S> {
    /// Create a source over the entries of `manifest`.
    #[must_use]
    pub fn new(store: Arc<S>, manifest: Manifest) -> Self {
        Self { store, manifest }
    }

    /// Stream all records into `sender`, then close it.
    pub async fn run(self, mut sender: RecordSender) -> DumpResult<SourceReport> {
        let mut report = SourceReport::default();

        for entry in &self.manifest.entries {
            let Some(location) = ObjectLocation::from_url(&entry.url) else {
                if ObjectLocation::has_scheme(&entry.url) {
                    return Err(DumpError::InvalidManifestEntry {
                        url: entry.url.clone(),
                    });
                }
                warn!(url = %entry.url, "skipping manifest entry with unsupported scheme");
                report.skipped_entries += 1;
                continue;
            };
            self.stream_object(&location, &mut sender, &mut report)
                .await?;
            report.objects += 1;
        }

        sender.close().await?;
        info!(
            objects = report.objects,
            records = report.records,
            malformed_lines = report.malformed_lines,
            "read backup objects"
        );
        Ok(report)
    }

    async fn stream_object(
        &self,
        location: &ObjectLocation,
        sender: &mut RecordSender,
        report: &mut SourceReport,
    ) -> DumpResult<()> {
        debug!(url = %location, "reading object");
        let reader = self.store.get_object(location).await?;
        let mut lines = reader.split(b'\n');
        let mut line_number = 0u64;

        while let Some(line) = lines
            .next_segment()
            .await
            .map_err(|source| ObjectStoreError::Read {
                url: location.url(),
                source,
            })?
        {
            line_number += 1;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match decode_item(&line) {
                Ok(item) => {
                    sender.send(item).await?;
                    report.records += 1;
                }
                Err(e) => {
                    report.malformed_lines += 1;
                    warn!(
                        url = %location,
                        line = line_number,
                        content = %String::from_utf8_lossy(&line),
                        error = %e,
                        "skipping malformed line"
                    );
                }
            }
        }
        Ok(())
    }
}
