//! Backup manifest.
//!
//! The manifest lists every data object of one backup run, in the order the
//! objects were flushed. It is stored as JSON next to the data objects:
//!
//! ```text
//! {"name":"DynamoDB-export","version":3,"entries":[{"url":"s3://bucket/prefix/<uuid>","mandatory":true}]}
//! ```

use serde::{Deserialize, Serialize};

/// Manifest name, fixed by the export format.
pub const MANIFEST_NAME: &str = "DynamoDB-export";

/// Manifest format version, fixed by the export format.
pub const MANIFEST_VERSION: u32 = 3;

/// A single data object reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Object URL, e.g. `s3://bucket/prefix/name`.
    pub url: String,
    /// Whether restore must read this object.
    pub mandatory: bool,
}

/// The manifest of one backup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Export name.
    pub name: String,
    /// Export format version.
    pub version: u32,
    /// Data objects in flush order.
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

impl Manifest {
    /// Create an empty manifest with the fixed name and version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: MANIFEST_NAME.to_owned(),
            version: MANIFEST_VERSION,
            entries: Vec::new(),
        }
    }

    /// Append a mandatory entry.
    pub fn push(&mut self, url: impl Into<String>) {
        self.entries.push(ManifestEntry {
            url: url.into(),
            mandatory: true,
        });
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest lists no object.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parse from JSON bytes.
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}
