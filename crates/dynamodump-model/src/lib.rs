//! Model types for dynamodump.
//!
//! This crate holds everything that crosses a process boundary: the
//! [`AttributeValue`] tagged union for table cells, the compact line codec used
//! for backup objects, the backup manifest, and the table-facing request and
//! error types shared by every backend implementation.
// "DynamoDB" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod codec;
pub mod error;
pub mod manifest;
pub mod types;

pub use attribute_value::AttributeValue;
pub use codec::{CodecError, WireValue, decode_item, decode_value, encode_item, encode_value};
pub use error::{TableError, TableErrorCode};
pub use manifest::{MANIFEST_NAME, MANIFEST_VERSION, Manifest, ManifestEntry};
pub use types::{
    BatchPutOutput, Item, Key, MAX_BATCH_WRITE_ITEMS, ScanPage, ScanRequest, TableStatus,
    TableSummary,
};
