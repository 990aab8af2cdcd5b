//! dynamodump - back up a DynamoDB table to S3 and restore it.
//!
//! A backup scans the table and writes newline-delimited JSON objects under
//! `s3://<bucket>/<folder>`, followed by a `manifest` and an empty `_SUCCESS`
//! marker. A restore reads a backup that has a marker back into a table.
//!
//! # Usage
//!
//! ```text
//! dynamodump --action backup --dynamo-table users --s3-bucket backups --s3-folder users --s3-date-folder
//! dynamodump --action restore --dynamo-table users --s3-bucket backups --s3-folder users/2024-03-09-07-05-01
//! ```
//!
//! # Environment Variables
//!
//! Every flag falls back to an environment variable.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ACTION` | `backup` | `backup` or `restore` |
//! | `DYNAMO_TABLE` | *(required)* | Table name |
//! | `S3_BUCKET` | *(required)* | Bucket name |
//! | `S3_FOLDER` | *(empty)* | Key prefix of the backup |
//! | `S3_DATE_FOLDER` | `false` | Add a UTC timestamp sub-folder on backup |
//! | `BATCH_SIZE` | `1000` | Scan page size / records per restore pause |
//! | `WAIT_MS` | `100` | Pacing delay in milliseconds |
//! | `RESTORE_APPEND` | `false` | Allow restoring into a non-empty table |
//! | `S3_BUFFER_SIZE` | `10485760` | Data object size threshold in bytes |
//! | `S3_STORAGE_CLASS` | `STANDARD_IA` | Storage class of uploads, empty for bucket default |
//! | `S3_SSE` | `AES256` | Server-side encryption of uploads, empty for bucket default |
//! | `AWS_REGION` | *(SDK default)* | Region override |
//! | `AWS_ENDPOINT_URL` | *(unset)* | Endpoint override, e.g. a local emulator |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dynamodump_aws::{AwsSettings, DynamoDbTable, S3ObjectStore, UploadOptions};
use dynamodump_core::config::{DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_SIZE, DEFAULT_WAIT_MS};
use dynamodump_core::{Action, DumpConfig, Pipeline, RunReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "dynamodump")]
#[command(version, about = "Back up a DynamoDB table to S3 and restore it", long_about = None)]
struct Args {
    /// backup or restore.
    #[arg(long, env = "ACTION", default_value = "backup")]
    action: Action,

    /// Table to back up or restore into.
    #[arg(long = "dynamo-table", env = "DYNAMO_TABLE")]
    table: String,

    /// Bucket holding the backup.
    #[arg(long = "s3-bucket", env = "S3_BUCKET")]
    bucket: String,

    /// Key prefix of the backup.
    #[arg(long = "s3-folder", env = "S3_FOLDER", default_value = "")]
    folder: String,

    /// Add a UTC timestamp sub-folder to the prefix on backup.
    #[arg(long = "s3-date-folder", env = "S3_DATE_FOLDER")]
    date_folder: bool,

    /// Scan page size on backup, records per pause on restore.
    #[arg(long = "batch-size", env = "BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: u32,

    /// Pacing delay in milliseconds.
    #[arg(long = "wait-ms", env = "WAIT_MS", default_value_t = DEFAULT_WAIT_MS)]
    wait_ms: u64,

    /// Allow restoring into a table that already holds items.
    #[arg(long = "restore-append", env = "RESTORE_APPEND")]
    restore_append: bool,

    /// Data object size threshold in bytes.
    #[arg(long = "s3-buffer-size", env = "S3_BUFFER_SIZE", default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Storage class of uploaded objects; empty for the bucket default.
    #[arg(long = "s3-storage-class", env = "S3_STORAGE_CLASS", default_value = "STANDARD_IA")]
    storage_class: String,

    /// Server-side encryption of uploaded objects; empty for the bucket default.
    #[arg(long = "s3-sse", env = "S3_SSE", default_value = "AES256")]
    server_side_encryption: String,

    /// Region override.
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Endpoint override for both services.
    #[arg(long = "endpoint-url", env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Log level filter.
    #[arg(long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn dump_config(&self) -> DumpConfig {
        DumpConfig::builder()
            .action(self.action)
            .table_name(self.table.clone())
            .bucket(self.bucket.clone())
            .folder(self.folder.clone())
            .date_folder(self.date_folder)
            .batch_size(self.batch_size)
            .wait_ms(self.wait_ms)
            .restore_append(self.restore_append)
            .buffer_size(self.buffer_size)
            .log_level(self.log_level.clone())
            .build()
    }

    fn aws_settings(&self) -> AwsSettings {
        AwsSettings::builder()
            .region(non_empty(self.region.as_deref()))
            .endpoint_url(non_empty(self.endpoint_url.as_deref()))
            .build()
    }

    fn upload_options(&self) -> UploadOptions {
        UploadOptions::builder()
            .storage_class(non_empty(Some(&self.storage_class)))
            .server_side_encryption(non_empty(Some(&self.server_side_encryption)))
            .build()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

fn log_report(report: &RunReport) {
    match report {
        RunReport::Backup(report) => info!(
            destination = %report.destination,
            pages = report.scan.pages,
            records = report.sink.records,
            objects = report.sink.objects.len(),
            bytes = report.sink.bytes,
            throttled = report.scan.throttled,
            "backup complete"
        ),
        RunReport::Restore(report) => info!(
            table = %report.table.table_name,
            objects = report.source.objects,
            records = report.writer.records,
            malformed_lines = report.source.malformed_lines,
            requests = report.writer.requests,
            retried_items = report.writer.retried_items,
            "restore complete"
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let config = args.dump_config();
    config.validate().context("invalid configuration")?;

    info!(
        version = VERSION,
        action = %config.action,
        table = %config.table_name,
        bucket = %config.bucket,
        folder = %config.folder,
        "starting dynamodump"
    );

    let aws = args.aws_settings();
    let sdk_config = aws.load().await;
    let table = Arc::new(DynamoDbTable::new(aws.dynamodb_client(&sdk_config)));
    let store = Arc::new(S3ObjectStore::with_options(
        aws.s3_client(&sdk_config),
        args.upload_options(),
    ));
    let pipeline = Pipeline::new(table, store, config);

    let report = tokio::select! {
        result = pipeline.run() => {
            result.with_context(|| format!("{} failed", args.action))?
        }
        _ = tokio::signal::ctrl_c() => {
            anyhow::bail!("interrupted, {} did not complete", args.action);
        }
    };

    log_report(&report);
    info!("All done");
    Ok(())
}
