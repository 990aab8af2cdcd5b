//! AWS connection settings.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Region and endpoint overrides for the AWS clients.
///
/// Anything left unset is resolved by the SDK default chain (environment,
/// profile, instance metadata).
///
/// # Examples
///
/// ```
/// use dynamodump_aws::config::AwsSettings;
///
/// let settings = AwsSettings::builder()
///     .endpoint_url(Some("http://localhost:4566".to_owned()))
///     .build();
/// assert!(settings.force_path_style);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct AwsSettings {
    /// Region override.
    #[builder(default)]
    pub region: Option<String>,

    /// Endpoint override shared by both services, e.g. a local emulator.
    #[builder(default)]
    pub endpoint_url: Option<String>,

    /// Use path-style bucket addressing. Defaults to on when an endpoint is
    /// overridden.
    #[builder(default = endpoint_url.is_some())]
    pub force_path_style: bool,
}

impl AwsSettings {
    /// Resolve the shared SDK configuration.
    pub async fn load(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        loader.load().await
    }

    /// Build a DynamoDB client.
    #[must_use]
    pub fn dynamodb_client(&self, sdk_config: &SdkConfig) -> aws_sdk_dynamodb::Client {
        aws_sdk_dynamodb::Client::new(sdk_config)
    }

    /// Build an S3 client honoring [`AwsSettings::force_path_style`].
    #[must_use]
    pub fn s3_client(&self, sdk_config: &SdkConfig) -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(self.force_path_style)
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }
}
