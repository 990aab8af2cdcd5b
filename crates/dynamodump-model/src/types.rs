//! Table-facing request and response types.
//!
//! These are the shapes exchanged with a table backend: one scan page at a
//! time, a table summary for the pre-flight check, and the result of a batch
//! put. They intentionally cover only what backup and restore need.

use std::collections::HashMap;
use std::str::FromStr;

use crate::attribute_value::AttributeValue;

/// Maximum number of write requests accepted by a single `BatchWriteItem`.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

// ---------------------------------------------------------------------------
// Type aliases for common DynamoDB item shapes
// ---------------------------------------------------------------------------

/// A DynamoDB item represented as a map of attribute names to values.
pub type Item = HashMap<String, AttributeValue>;

/// A DynamoDB key represented as a map of key attribute names to values.
pub type Key = HashMap<String, AttributeValue>;

// ---------------------------------------------------------------------------
// Table status
// ---------------------------------------------------------------------------

/// Current status of a DynamoDB table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableStatus {
    /// The table is being created.
    Creating,
    /// The table is ready for use.
    Active,
    /// The table is being deleted.
    Deleting,
    /// The table is being updated (e.g., GSI changes).
    Updating,
    /// The table is being archived.
    Archiving,
    /// The table has been archived.
    Archived,
    /// The table is inaccessible due to encryption credentials issues.
    InaccessibleEncryptionCredentials,
    /// A status this crate does not know about.
    Unknown(String),
}

impl TableStatus {
    /// Returns the DynamoDB wire-format string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "CREATING",
            Self::Active => "ACTIVE",
            Self::Deleting => "DELETING",
            Self::Updating => "UPDATING",
            Self::Archiving => "ARCHIVING",
            Self::Archived => "ARCHIVED",
            Self::InaccessibleEncryptionCredentials => "INACCESSIBLE_ENCRYPTION_CREDENTIALS",
            Self::Unknown(s) => s,
        }
    }

    /// Only an active table accepts writes.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        *self == Self::Active
    }
}

impl From<&str> for TableStatus {
    fn from(s: &str) -> Self {
        match s {
            "CREATING" => Self::Creating,
            "ACTIVE" => Self::Active,
            "DELETING" => Self::Deleting,
            "UPDATING" => Self::Updating,
            "ARCHIVING" => Self::Archiving,
            "ARCHIVED" => Self::Archived,
            "INACCESSIBLE_ENCRYPTION_CREDENTIALS" => Self::InaccessibleEncryptionCredentials,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl FromStr for TableStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subset of `DescribeTable` used by the restore pre-flight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    /// The name of the table.
    pub table_name: String,
    /// The current status of the table.
    pub status: TableStatus,
    /// The approximate number of items in the table.
    pub item_count: i64,
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// A request for one page of a full-table scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    /// The name of the table to scan.
    pub table_name: String,
    /// The maximum number of items to evaluate for this page.
    pub limit: Option<i32>,
    /// The primary key of the first item to evaluate. `None` on the first page.
    pub exclusive_start_key: Option<Key>,
}

/// One page of scan results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    /// The items of this page, in backend order.
    pub items: Vec<Item>,
    /// Continuation key; `None` when this is the last page.
    pub last_evaluated_key: Option<Key>,
    /// Capacity units consumed by the request, when reported.
    pub consumed_capacity: Option<f64>,
}

impl ScanPage {
    /// Whether the backend reported no further pages.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.last_evaluated_key.is_none()
    }
}

// ---------------------------------------------------------------------------
// Batch put
// ---------------------------------------------------------------------------

/// Result of a batch put request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPutOutput {
    /// Items the backend did not apply and that must be resubmitted.
    pub unprocessed_items: Vec<Item>,
    /// Capacity units consumed by the request, when reported.
    pub consumed_capacity: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_table_status() {
        assert_eq!("ACTIVE".parse::<TableStatus>(), Ok(TableStatus::Active));
        assert_eq!("UPDATING".parse::<TableStatus>(), Ok(TableStatus::Updating));
        assert_eq!(
            "REPLICATING".parse::<TableStatus>(),
            Ok(TableStatus::Unknown("REPLICATING".to_owned()))
        );
    }

    #[test]
    fn test_should_only_write_to_active_table() {
        assert!(TableStatus::Active.is_writable());
        assert!(!TableStatus::Creating.is_writable());
        assert!(!TableStatus::Unknown("X".to_owned()).is_writable());
    }

    #[test]
    fn test_should_detect_last_page() {
        let mut page = ScanPage::default();
        assert!(page.is_last());
        let mut key = Key::new();
        key.insert("pk".to_owned(), AttributeValue::S("a".to_owned()));
        page.last_evaluated_key = Some(key);
        assert!(!page.is_last());
    }
}
