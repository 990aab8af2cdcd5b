//! Run configuration.
//!
//! Provides [`DumpConfig`], the settings of one backup or restore run. The
//! command line fills it from flags and their environment fallbacks.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::destination::Destination;
use crate::error::{DumpError, DumpResult};

/// Default number of records per pacing window.
pub const DEFAULT_BATCH_SIZE: u32 = 1000;

/// Default pacing delay in milliseconds.
pub const DEFAULT_WAIT_MS: u64 = 100;

/// Default size threshold of a data object, 10 MiB.
pub const DEFAULT_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Direction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Table to object store.
    #[default]
    Backup,
    /// Object store to table.
    Restore,
}

impl Action {
    /// Returns the lowercase action name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backup => "backup",
            Self::Restore => "restore",
        }
    }
}

impl FromStr for Action {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("backup") {
            Ok(Self::Backup)
        } else if s.eq_ignore_ascii_case("restore") {
            Ok(Self::Restore)
        } else {
            Err(DumpError::Config(format!(
                "unknown action {s:?}, expected backup or restore"
            )))
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings of one backup or restore run.
///
/// # Examples
///
/// ```
/// use dynamodump_core::config::{Action, DumpConfig};
///
/// let config = DumpConfig::builder()
///     .action(Action::Restore)
///     .table_name("users")
///     .bucket("backups")
///     .build();
/// assert_eq!(config.batch_size, 1000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct DumpConfig {
    /// Backup or restore.
    #[builder(default)]
    pub action: Action,

    /// Table to read from or write to.
    #[builder(setter(into))]
    pub table_name: String,

    /// Bucket holding the backup.
    #[builder(setter(into))]
    pub bucket: String,

    /// Key prefix of the backup inside the bucket.
    #[builder(default, setter(into))]
    pub folder: String,

    /// Append a UTC timestamp sub-folder to the prefix on backup.
    #[builder(default = false)]
    pub date_folder: bool,

    /// Scan page size on backup, records per pacing window on restore.
    /// Zero leaves the scan page size to the table backend.
    #[builder(default = DEFAULT_BATCH_SIZE)]
    pub batch_size: u32,

    /// Pacing delay in milliseconds. Throttle back-off waits twice as long.
    #[builder(default = DEFAULT_WAIT_MS)]
    pub wait_ms: u64,

    /// Allow restoring into a table that already holds items.
    #[builder(default = false)]
    pub restore_append: bool,

    /// Size threshold in bytes at which a data object is flushed.
    #[builder(default = DEFAULT_BUFFER_SIZE)]
    pub buffer_size: usize,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"), setter(into))]
    pub log_level: String,
}

impl DumpConfig {
    /// Check the settings before any backend is touched.
    pub fn validate(&self) -> DumpResult<()> {
        if self.table_name.trim().is_empty() {
            return Err(DumpError::Config("table name is required".to_owned()));
        }
        if self.bucket.trim().is_empty() {
            return Err(DumpError::Config("bucket is required".to_owned()));
        }
        if self.buffer_size == 0 {
            return Err(DumpError::Config(
                "buffer size must be greater than zero".to_owned(),
            ));
        }
        if self.action == Action::Restore && self.batch_size == 0 {
            return Err(DumpError::Config(
                "batch size must be at least 1 for restore".to_owned(),
            ));
        }
        Ok(())
    }

    /// Pacing delay.
    #[must_use]
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    /// Scan page size, `None` when left to the backend.
    #[must_use]
    pub fn scan_limit(&self) -> Option<i32> {
        if self.batch_size == 0 {
            None
        } else {
            Some(i32::try_from(self.batch_size).unwrap_or(i32::MAX))
        }
    }

    /// Where a backup started at `now` writes its objects.
    #[must_use]
    pub fn backup_destination(&self, now: DateTime<Utc>) -> Destination {
        let destination = Destination::new(&self.bucket, &self.folder);
        if self.date_folder {
            destination.with_timestamp(now)
        } else {
            destination
        }
    }

    /// Where a restore reads its objects from. The folder is used as given.
    #[must_use]
    pub fn restore_destination(&self) -> Destination {
        Destination::new(&self.bucket, &self.folder)
    }
}
