//! AWS backends for dynamodump.
//!
//! [`DynamoDbTable`] implements the table backend on top of the DynamoDB
//! client and [`S3ObjectStore`] implements the object store on top of the S3
//! client. [`AwsSettings::load`] resolves the shared SDK configuration.

pub mod config;
pub mod convert;
pub mod dynamodb;
pub mod s3;

pub use config::AwsSettings;
pub use dynamodb::DynamoDbTable;
pub use s3::{S3ObjectStore, UploadOptions};
