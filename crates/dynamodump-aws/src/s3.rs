//! S3 object store backend.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{ServerSideEncryption, StorageClass};
use bytes::Bytes;
use dynamodump_core::{ObjectLocation, ObjectReader, ObjectStore, ObjectStoreError};
use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

/// Attributes applied to every uploaded object.
///
/// Backups are written once and read rarely, so objects default to the
/// infrequent-access storage class with S3-managed encryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct UploadOptions {
    /// Storage class name, e.g. `STANDARD_IA`. `None` uses the bucket default.
    #[builder(default = Some(String::from("STANDARD_IA")))]
    pub storage_class: Option<String>,

    /// Server-side encryption algorithm, e.g. `AES256`. `None` uses the
    /// bucket default.
    #[builder(default = Some(String::from("AES256")))]
    pub server_side_encryption: Option<String>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// An [`ObjectStore`] backed by S3.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    options: UploadOptions,
}

impl S3ObjectStore {
    /// Wrap a configured client with default upload options.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_options(client, UploadOptions::default())
    }

    /// Wrap a configured client.
    #[must_use]
    pub fn with_options(client: Client, options: UploadOptions) -> Self {
        Self { client, options }
    }
}

fn request_error<E>(location: &ObjectLocation, err: E) -> ObjectStoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ObjectStoreError::Request {
        url: location.url(),
        message: DisplayErrorContext(&err).to_string(),
        source: Some(Box::new(err)),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(
        &self,
        location: &ObjectLocation,
    ) -> Result<ObjectReader, ObjectStoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(GetObjectError::is_no_such_key) {
                    ObjectStoreError::NotFound {
                        url: location.url(),
                    }
                } else {
                    request_error(location, e)
                }
            })?;
        Ok(Box::pin(output.body.into_async_read()))
    }

    async fn exists(&self, location: &ObjectLocation) -> Result<bool, ObjectStoreError> {
        match self
            .client
            .head_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(HeadObjectError::is_not_found) => Ok(false),
            Err(e) => Err(request_error(location, e)),
        }
    }

    async fn put_object(
        &self,
        location: &ObjectLocation,
        data: Bytes,
    ) -> Result<(), ObjectStoreError> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .body(ByteStream::from(data))
            .set_storage_class(self.options.storage_class.as_deref().map(StorageClass::from))
            .set_server_side_encryption(
                self.options
                    .server_side_encryption
                    .as_deref()
                    .map(ServerSideEncryption::from),
            )
            .send()
            .await
            .map_err(|e| request_error(location, e))?;
        debug!(url = %location, size, "uploaded object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_default_to_infrequent_access_with_sse() {
        let options = UploadOptions::default();
        assert_eq!(options.storage_class.as_deref(), Some("STANDARD_IA"));
        assert_eq!(options.server_side_encryption.as_deref(), Some("AES256"));
        assert_eq!(
            StorageClass::from("STANDARD_IA"),
            StorageClass::StandardIa
        );
        assert_eq!(
            ServerSideEncryption::from("AES256"),
            ServerSideEncryption::Aes256
        );
    }

    #[test]
    fn test_should_allow_bucket_defaults() {
        let options = UploadOptions::builder()
            .storage_class(None)
            .server_side_encryption(None)
            .build();
        assert!(options.storage_class.is_none());
        assert!(options.server_side_encryption.is_none());
    }
}
