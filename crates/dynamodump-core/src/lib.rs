//! Backup and restore pipeline for dynamodump.
//!
//! A run is two tasks joined by a [`channel`]: a producer that reads records
//! from one backend and a consumer that writes them to the other.
//!
//! ```text
//! backup:  TableScanner  -> channel -> ObjectSink         -> objects + manifest + _SUCCESS
//! restore: ObjectSource  -> channel -> BatchTableWriter   -> table
//! ```
//!
//! The backends are traits ([`backend::TableBackend`], [`backend::ObjectStore`]);
//! [`memory`] provides in-process implementations and the `dynamodump-aws`
//! crate provides the AWS ones. [`pipeline::Pipeline`] wires everything for one
//! run from a [`config::DumpConfig`].

pub mod backend;
pub mod channel;
pub mod config;
pub mod destination;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod preflight;
pub mod scanner;
pub mod sink;
pub mod source;
pub mod writer;

pub use backend::{ObjectReader, ObjectStore, TableBackend};
pub use config::{Action, DumpConfig};
pub use destination::{Destination, ObjectLocation};
pub use error::{DumpError, DumpResult, ObjectStoreError};
pub use pipeline::{BackupReport, Pipeline, RestoreReport, RunReport};
