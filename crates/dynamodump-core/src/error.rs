//! Error types for backup and restore runs.

use dynamodump_model::{CodecError, TableError, TableStatus};

/// An error reported by an object store backend.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    /// The object does not exist.
    #[error("object not found: {url}")]
    NotFound {
        /// Object URL.
        url: String,
    },

    /// The backend rejected or failed the request.
    #[error("object store request failed for {url}: {message}")]
    Request {
        /// Object URL.
        url: String,
        /// Backend error message.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reading the object body failed.
    #[error("failed to read object {url}: {source}")]
    Read {
        /// Object URL.
        url: String,
        /// I/O error from the body stream.
        #[source]
        source: std::io::Error,
    },
}

impl ObjectStoreError {
    /// Build a request error without an underlying source.
    #[must_use]
    pub fn request(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Whether the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Error type of a backup or restore run.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    /// Invalid run settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// The restore target table does not exist.
    #[error("table {table} does not exist")]
    TableNotFound {
        /// Table name.
        table: String,
    },

    /// The restore target table is not in a writable state.
    #[error("table {table} is not writable, status is {status}")]
    TableNotWritable {
        /// Table name.
        table: String,
        /// Reported status.
        status: TableStatus,
    },

    /// The restore target table already holds items and append is off.
    #[error("table {table} is not empty ({count} items), enable append to restore into it")]
    TableNotEmpty {
        /// Table name.
        table: String,
        /// Reported item count.
        count: i64,
    },

    /// The backup has no completion marker.
    #[error("completion marker {url} not found, backup is absent or incomplete")]
    MissingCompletionMarker {
        /// Marker URL.
        url: String,
    },

    /// The backup has a completion marker but no manifest.
    #[error("manifest {url} not found")]
    ManifestMissing {
        /// Manifest URL.
        url: String,
    },

    /// The manifest could not be parsed.
    #[error("manifest {url} is corrupt: {source}")]
    ManifestCorrupt {
        /// Manifest URL.
        url: String,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A manifest entry claims the object store scheme but is not a valid URL.
    #[error("invalid manifest entry {url}")]
    InvalidManifestEntry {
        /// Entry URL as written in the manifest.
        url: String,
    },

    /// The manifest could not be serialized.
    #[error("failed to encode manifest: {0}")]
    ManifestEncode(#[source] serde_json::Error),

    /// A table backend request failed.
    #[error(transparent)]
    Table(#[from] TableError),

    /// An object store request failed.
    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),

    /// A record could not be encoded.
    #[error("failed to encode record: {0}")]
    Codec(#[from] CodecError),

    /// The producer went away without closing the stream.
    #[error("record producer stopped before the end of the stream")]
    ProducerAborted,

    /// The consumer went away before the end of the stream.
    #[error("record consumer stopped before the end of the stream")]
    ConsumerGone,

    /// A pipeline task panicked or was cancelled.
    #[error("pipeline task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl DumpError {
    /// Whether the run was refused before any record moved.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::TableNotFound { .. }
                | Self::TableNotWritable { .. }
                | Self::TableNotEmpty { .. }
                | Self::MissingCompletionMarker { .. }
                | Self::ManifestMissing { .. }
                | Self::ManifestCorrupt { .. }
        )
    }

    /// Whether this error only reports that the other side of the stream failed.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::ProducerAborted | Self::ConsumerGone)
    }
}

/// Convenience result type for backup and restore operations.
pub type DumpResult<T> = Result<T, DumpError>;
