//! In-memory table and object store.
//!
//! Both backends keep everything in process and are safe to share between
//! the producer and consumer tasks. They can be told to fail in the ways the
//! real services fail (throttling, partial batch writes, rejected puts), which
//! is what the pipeline tests rely on.
//!
//! # Architecture
//!
//! ```text
//! MemoryTable:       RwLock<BTreeMap<SortableKey, Item>>   one hash key, ordered scans
//! MemoryObjectStore: DashMap<ObjectLocation, Bytes>        plus a log of puts in order
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::ops::Bound;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dynamodump_model::{
    AttributeValue, BatchPutOutput, Item, Key, MAX_BATCH_WRITE_ITEMS, ScanPage, ScanRequest,
    TableError, TableErrorCode, TableStatus, TableSummary,
};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::backend::{ObjectReader, ObjectStore, TableBackend};
use crate::destination::ObjectLocation;
use crate::error::ObjectStoreError;

// ---------------------------------------------------------------------------
// SortableKey
// ---------------------------------------------------------------------------

/// A hash key value with DynamoDB ordering: strings and binaries by bytes,
/// numbers numerically.
#[derive(Debug, Clone)]
enum SortableKey {
    S(String),
    N(String),
    B(Bytes),
}

impl SortableKey {
    fn from_attribute_value(name: &str, value: &AttributeValue) -> Result<Self, TableError> {
        match value {
            AttributeValue::S(s) => Ok(Self::S(s.clone())),
            AttributeValue::N(n) => Ok(Self::N(n.clone())),
            AttributeValue::B(b) => Ok(Self::B(b.clone())),
            other => Err(TableError::validation(format!(
                "key attribute '{name}' has wrong type: expected S, N, or B, got {}",
                other.type_descriptor()
            ))),
        }
    }

    fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Self::S(s) => AttributeValue::S(s.clone()),
            Self::N(n) => AttributeValue::N(n.clone()),
            Self::B(b) => AttributeValue::B(b.clone()),
        }
    }
}

fn parse_number(s: &str) -> f64 {
    s.parse::<f64>().unwrap_or(f64::NAN)
}

impl PartialEq for SortableKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortableKey {}

impl PartialOrd for SortableKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortableKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::S(a), Self::S(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Self::N(a), Self::N(b)) => parse_number(a)
                .partial_cmp(&parse_number(b))
                .unwrap_or_else(|| a.cmp(b)),
            (Self::B(a), Self::B(b)) => a.as_ref().cmp(b.as_ref()),
            (Self::S(_), _) => Ordering::Less,
            (_, Self::S(_)) => Ordering::Greater,
            (Self::N(_), _) => Ordering::Less,
            (_, Self::N(_)) => Ordering::Greater,
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryTable
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TableFaults {
    scan_throttles: u32,
    scan_failure: Option<(u64, TableErrorCode)>,
    write_throttles: u32,
    write_failure: Option<TableErrorCode>,
    max_items_per_batch: Option<usize>,
}

/// A single table keyed by one hash key attribute.
///
/// Scans return items in key order. Without a limit a scan returns all
/// remaining items in one page.
#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    key_attribute: String,
    status: RwLock<TableStatus>,
    items: RwLock<BTreeMap<SortableKey, Item>>,
    faults: Mutex<TableFaults>,
    scan_pages: Mutex<u64>,
    batches: Mutex<Vec<Vec<Item>>>,
}

impl MemoryTable {
    /// Create an empty, active table.
    #[must_use]
    pub fn new(name: impl Into<String>, key_attribute: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_attribute: key_attribute.into(),
            status: RwLock::new(TableStatus::Active),
            items: RwLock::new(BTreeMap::new()),
            faults: Mutex::new(TableFaults::default()),
            scan_pages: Mutex::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Change the reported table status.
    pub fn set_status(&self, status: TableStatus) {
        *self.status.write() = status;
    }

    /// Insert or replace an item.
    pub fn insert(&self, item: Item) -> Result<(), TableError> {
        let key = self.key_of(&item)?;
        self.items.write().insert(key, item);
        Ok(())
    }

    /// All items in key order.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.items.read().values().cloned().collect()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether the table holds no item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Sizes of all batch put requests received, in order.
    #[must_use]
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().iter().map(Vec::len).collect()
    }

    /// Items of all batch put requests received, in order.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<Item>> {
        self.batches.lock().clone()
    }

    /// Reject the next `count` scan requests with a throttling error.
    pub fn throttle_scans(&self, count: u32) {
        self.faults.lock().scan_throttles = count;
    }

    /// Fail every scan request once `pages` pages have been served.
    pub fn fail_scans_after(&self, pages: u64, code: TableErrorCode) {
        self.faults.lock().scan_failure = Some((pages, code));
    }

    /// Reject the next `count` batch put requests with a throttling error.
    pub fn throttle_writes(&self, count: u32) {
        self.faults.lock().write_throttles = count;
    }

    /// Fail every batch put request with `code`.
    pub fn fail_writes(&self, code: TableErrorCode) {
        self.faults.lock().write_failure = Some(code);
    }

    /// Apply at most `count` items per batch put and return the rest as
    /// unprocessed.
    pub fn limit_items_per_batch(&self, count: usize) {
        self.faults.lock().max_items_per_batch = Some(count);
    }

    fn key_of(&self, item: &Item) -> Result<SortableKey, TableError> {
        let value = item.get(&self.key_attribute).ok_or_else(|| {
            TableError::validation(format!(
                "missing required key attribute: {}",
                self.key_attribute
            ))
        })?;
        SortableKey::from_attribute_value(&self.key_attribute, value)
    }

    fn check_name(&self, table_name: &str) -> Result<(), TableError> {
        if table_name == self.name {
            Ok(())
        } else {
            Err(TableError::resource_not_found(format!(
                "Requested resource not found: Table: {table_name} not found"
            )))
        }
    }

    fn scan_fault(&self) -> Option<TableError> {
        let mut faults = self.faults.lock();
        if faults.scan_throttles > 0 {
            faults.scan_throttles -= 1;
            return Some(TableError::throughput_exceeded(
                "The level of configured provisioned throughput for the table was exceeded",
            ));
        }
        let served = *self.scan_pages.lock();
        match faults.scan_failure {
            Some((pages, code)) if served >= pages => Some(TableError::new(code)),
            _ => None,
        }
    }

    fn write_fault(&self) -> Option<TableError> {
        let mut faults = self.faults.lock();
        if faults.write_throttles > 0 {
            faults.write_throttles -= 1;
            return Some(TableError::throughput_exceeded(
                "The level of configured provisioned throughput for the table was exceeded",
            ));
        }
        faults.write_failure.map(TableError::new)
    }
}

#[async_trait]
impl TableBackend for MemoryTable {
    async fn scan_page(&self, request: &ScanRequest) -> Result<ScanPage, TableError> {
        self.check_name(&request.table_name)?;
        if let Some(err) = self.scan_fault() {
            return Err(err);
        }

        let start = match &request.exclusive_start_key {
            Some(key) => Bound::Excluded(self.key_of(key)?),
            None => Bound::Unbounded,
        };
        let limit = match request.limit {
            Some(limit) if limit < 1 => {
                return Err(TableError::validation("Limit must be greater than or equal to 1"));
            }
            Some(limit) => usize::try_from(limit).unwrap_or(usize::MAX),
            None => usize::MAX,
        };

        let items = self.items.read();
        let mut remaining = items.range((start, Bound::Unbounded));
        let page: Vec<(SortableKey, Item)> = remaining
            .by_ref()
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let has_more = remaining.next().is_some();
        drop(items);

        let last_evaluated_key = if has_more {
            page.last().map(|(key, _)| {
                let mut last = Key::new();
                last.insert(self.key_attribute.clone(), key.to_attribute_value());
                last
            })
        } else {
            None
        };

        *self.scan_pages.lock() += 1;
        let items: Vec<Item> = page.into_iter().map(|(_, item)| item).collect();
        debug!(table = %self.name, items = items.len(), more = has_more, "served scan page");

        #[allow(clippy::cast_precision_loss)]
        let consumed_capacity = Some(items.len() as f64 * 0.5);
        Ok(ScanPage {
            items,
            last_evaluated_key,
            consumed_capacity,
        })
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableSummary, TableError> {
        self.check_name(table_name)?;
        Ok(TableSummary {
            table_name: self.name.clone(),
            status: self.status.read().clone(),
            item_count: i64::try_from(self.len()).unwrap_or(i64::MAX),
        })
    }

    async fn batch_put(
        &self,
        table_name: &str,
        items: &[Item],
    ) -> Result<BatchPutOutput, TableError> {
        self.check_name(table_name)?;
        if items.is_empty() || items.len() > MAX_BATCH_WRITE_ITEMS {
            return Err(TableError::validation(format!(
                "Too many items requested for the BatchWriteItem call: {}",
                items.len()
            )));
        }
        self.batches.lock().push(items.to_vec());
        if let Some(err) = self.write_fault() {
            return Err(err);
        }

        let keys = items
            .iter()
            .map(|item| self.key_of(item))
            .collect::<Result<Vec<_>, _>>()?;

        let applied = self
            .faults
            .lock()
            .max_items_per_batch
            .unwrap_or(MAX_BATCH_WRITE_ITEMS)
            .min(items.len());

        let mut table = self.items.write();
        for (key, item) in keys.into_iter().zip(items).take(applied) {
            table.insert(key, item.clone());
        }
        drop(table);

        #[allow(clippy::cast_precision_loss)]
        let consumed_capacity = Some(applied as f64);
        Ok(BatchPutOutput {
            unprocessed_items: items[applied..].to_vec(),
            consumed_capacity,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryObjectStore
// ---------------------------------------------------------------------------

/// Objects held in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<ObjectLocation, Bytes>,
    put_log: Mutex<Vec<String>>,
    puts_before_failure: Mutex<Option<usize>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object directly, bypassing the put log and fault injection.
    pub fn insert(&self, location: ObjectLocation, data: impl Into<Bytes>) {
        self.objects.insert(location, data.into());
    }

    /// Read an object directly.
    #[must_use]
    pub fn get(&self, location: &ObjectLocation) -> Option<Bytes> {
        self.objects.get(location).map(|entry| entry.value().clone())
    }

    /// Remove an object.
    pub fn remove(&self, location: &ObjectLocation) -> Option<Bytes> {
        self.objects.remove(location).map(|(_, data)| data)
    }

    /// Sorted keys of all objects in `bucket`.
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .iter()
            .filter(|entry| entry.key().bucket == bucket)
            .map(|entry| entry.key().key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// URLs of all successful puts, in order.
    #[must_use]
    pub fn put_log(&self) -> Vec<String> {
        self.put_log.lock().clone()
    }

    /// Let `count` more puts succeed, then reject every put.
    pub fn fail_puts_after(&self, count: usize) {
        *self.puts_before_failure.lock() = Some(count);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(
        &self,
        location: &ObjectLocation,
    ) -> Result<ObjectReader, ObjectStoreError> {
        let data = self.get(location).ok_or_else(|| ObjectStoreError::NotFound {
            url: location.url(),
        })?;
        Ok(Box::pin(Cursor::new(data)))
    }

    async fn exists(&self, location: &ObjectLocation) -> Result<bool, ObjectStoreError> {
        Ok(self.objects.contains_key(location))
    }

    async fn put_object(
        &self,
        location: &ObjectLocation,
        data: Bytes,
    ) -> Result<(), ObjectStoreError> {
        {
            let mut remaining = self.puts_before_failure.lock();
            match remaining.as_mut() {
                Some(0) => {
                    return Err(ObjectStoreError::request(
                        location.url(),
                        "InternalError: injected put failure",
                    ));
                }
                Some(n) => *n -= 1,
                None => {}
            }
        }
        self.objects.insert(location.clone(), data);
        self.put_log.lock().push(location.url());
        Ok(())
    }
}
