//! Integration tests for dynamodump.
//!
//! `test_pipeline` runs whole backups and restores against the in-memory
//! backends and needs nothing else. `test_aws` talks to DynamoDB and S3
//! compatible services at `localhost:4566`; those tests are marked `#[ignore]`
//! so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p dynamodump-integration -- --ignored
//! ```

use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use bytes::Bytes;
use dynamodump_model::{AttributeValue, Item};

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the services.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("AWS_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Create a configured S3 client pointing at the local endpoint.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Create a configured DynamoDB client pointing at the local endpoint.
#[must_use]
pub fn dynamodb_client() -> aws_sdk_dynamodb::Client {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");

    let config = aws_sdk_dynamodb::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .build();

    aws_sdk_dynamodb::Client::from_conf(config)
}

/// Generate a unique resource name for a test.
#[must_use]
pub fn test_resource_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// A user record with every attribute type, keyed by `pk`.
#[must_use]
pub fn sample_item(n: u32) -> Item {
    let mut address = std::collections::HashMap::new();
    address.insert("city".to_owned(), AttributeValue::S("Lisbon".to_owned()));
    address.insert("zip".to_owned(), AttributeValue::Null(true));

    let mut item = Item::new();
    item.insert("pk".to_owned(), AttributeValue::S(format!("user#{n:04}")));
    item.insert("age".to_owned(), AttributeValue::N((20 + n % 50).to_string()));
    item.insert("active".to_owned(), AttributeValue::Bool(n % 2 == 0));
    item.insert(
        "avatar".to_owned(),
        AttributeValue::B(Bytes::from(vec![0xff, 0x00, u8::try_from(n % 256).unwrap_or(0)])),
    );
    item.insert(
        "roles".to_owned(),
        AttributeValue::Ss(vec!["reader".to_owned(), "writer".to_owned()]),
    );
    item.insert(
        "scores".to_owned(),
        AttributeValue::Ns(vec!["1".to_owned(), "2.5".to_owned()]),
    );
    item.insert(
        "keys".to_owned(),
        AttributeValue::Bs(vec![Bytes::from_static(b"k1")]),
    );
    item.insert(
        "history".to_owned(),
        AttributeValue::L(vec![
            AttributeValue::M(address),
            AttributeValue::L(vec![]),
            AttributeValue::S(String::new()),
        ]),
    );
    item
}

mod test_aws;
mod test_pipeline;
