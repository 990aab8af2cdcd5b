//! Object locations of a backup.
//!
//! A backup lives under one bucket and key prefix:
//!
//! ```text
//! <prefix>/<uuid>      data objects, one per flush
//! <prefix>/manifest    list of data objects
//! <prefix>/_SUCCESS    completion marker, written last
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Object name of the manifest.
pub const MANIFEST_OBJECT: &str = "manifest";

/// Object name of the completion marker.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// URL scheme of object locations.
pub const URL_SCHEME: &str = "s3://";

/// Format of the optional timestamp sub-folder.
pub const DATE_FOLDER_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// A bucket and key pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
}

impl ObjectLocation {
    /// Create a location.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Returns the `s3://bucket/key` URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{URL_SCHEME}{}/{}", self.bucket, self.key)
    }

    /// Parse an `s3://bucket/key` URL.
    ///
    /// Returns `None` for other schemes and for URLs without a bucket or key.
    /// Leading slashes of the key are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamodump_core::destination::ObjectLocation;
    ///
    /// let loc = ObjectLocation::from_url("s3://backups/nightly/abc").unwrap();
    /// assert_eq!(loc.bucket, "backups");
    /// assert_eq!(loc.key, "nightly/abc");
    /// assert!(ObjectLocation::from_url("https://example.com/x").is_none());
    /// ```
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix(URL_SCHEME)?;
        let (bucket, key) = rest.split_once('/')?;
        let key = key.trim_start_matches('/');
        if bucket.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self::new(bucket, key))
    }

    /// Whether `url` uses the object store scheme at all.
    #[must_use]
    pub fn has_scheme(url: &str) -> bool {
        url.starts_with(URL_SCHEME)
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{URL_SCHEME}{}/{}", self.bucket, self.key)
    }
}

/// The bucket and prefix of one backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    bucket: String,
    prefix: String,
}

impl Destination {
    /// Create a destination. Slashes around the prefix are dropped.
    #[must_use]
    pub fn new(bucket: impl Into<String>, prefix: &str) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.trim_matches('/').to_owned(),
        }
    }

    /// Append a `YYYY-MM-DD-HH-MM-SS` sub-folder for `now`.
    #[must_use]
    pub fn with_timestamp(self, now: DateTime<Utc>) -> Self {
        let stamp = now.format(DATE_FOLDER_FORMAT).to_string();
        let prefix = if self.prefix.is_empty() {
            stamp
        } else {
            format!("{}/{stamp}", self.prefix)
        };
        Self { prefix, ..self }
    }

    /// Bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Key prefix, without leading or trailing slash.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Location of the named object under the prefix.
    #[must_use]
    pub fn object(&self, name: &str) -> ObjectLocation {
        let key = if self.prefix.is_empty() {
            name.to_owned()
        } else {
            format!("{}/{name}", self.prefix)
        };
        ObjectLocation::new(self.bucket.clone(), key)
    }

    /// Location for a new data object with a fresh unique name.
    #[must_use]
    pub fn new_data_object(&self) -> ObjectLocation {
        self.object(&Uuid::new_v4().to_string())
    }

    /// Location of the manifest.
    #[must_use]
    pub fn manifest(&self) -> ObjectLocation {
        self.object(MANIFEST_OBJECT)
    }

    /// Location of the completion marker.
    #[must_use]
    pub fn success_marker(&self) -> ObjectLocation {
        self.object(SUCCESS_MARKER)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{URL_SCHEME}{}/{}", self.bucket, self.prefix)
    }
}
