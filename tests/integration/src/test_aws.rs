//! Backups and restores against DynamoDB and S3 compatible services.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aws_sdk_dynamodb::types::{
        AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
    };
    use bytes::Bytes;
    use dynamodump_aws::convert::to_sdk_item;
    use dynamodump_aws::{DynamoDbTable, S3ObjectStore, UploadOptions};
    use dynamodump_core::destination::Destination;
    use dynamodump_core::{Action, DumpConfig, DumpError, ObjectStore, Pipeline, TableBackend};

    use crate::{dynamodb_client, s3_client, sample_item, test_resource_name};

    async fn create_table(client: &aws_sdk_dynamodb::Client, table_name: &str) {
        client
            .create_table()
            .table_name(table_name)
            .key_schema(
                KeySchemaElement::builder()
                    .attribute_name("pk")
                    .key_type(KeyType::Hash)
                    .build()
                    .unwrap(),
            )
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name("pk")
                    .attribute_type(ScalarAttributeType::S)
                    .build()
                    .unwrap(),
            )
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .unwrap_or_else(|e| panic!("failed to create table {table_name}: {e}"));
    }

    async fn create_bucket(client: &aws_sdk_s3::Client) -> String {
        let name = test_resource_name("dump");
        client
            .create_bucket()
            .bucket(&name)
            .send()
            .await
            .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
        name
    }

    async fn cleanup(
        dynamodb: &aws_sdk_dynamodb::Client,
        s3: &aws_sdk_s3::Client,
        tables: &[&str],
        bucket: &str,
    ) {
        for table in tables {
            let _ = dynamodb.delete_table().table_name(*table).send().await;
        }
        if let Ok(resp) = s3.list_objects_v2().bucket(bucket).send().await {
            for obj in resp.contents() {
                if let Some(key) = obj.key() {
                    let _ = s3.delete_object().bucket(bucket).key(key).send().await;
                }
            }
        }
        let _ = s3.delete_bucket().bucket(bucket).send().await;
    }

    fn store(s3: &aws_sdk_s3::Client) -> Arc<S3ObjectStore> {
        let options = UploadOptions::builder()
            .storage_class(None)
            .server_side_encryption(None)
            .build();
        Arc::new(S3ObjectStore::with_options(s3.clone(), options))
    }

    fn config(action: Action, table: &str, bucket: &str) -> DumpConfig {
        DumpConfig::builder()
            .action(action)
            .table_name(table)
            .bucket(bucket)
            .folder("it")
            .batch_size(7)
            .wait_ms(0)
            .buffer_size(1024)
            .build()
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_backup_and_restore_through_aws_clients() {
        let dynamodb = dynamodb_client();
        let s3 = s3_client();
        let source_name = test_resource_name("src");
        let target_name = test_resource_name("dst");
        create_table(&dynamodb, &source_name).await;
        create_table(&dynamodb, &target_name).await;
        let bucket = create_bucket(&s3).await;

        for n in 0..30 {
            dynamodb
                .put_item()
                .table_name(&source_name)
                .set_item(Some(to_sdk_item(&sample_item(n))))
                .send()
                .await
                .unwrap();
        }

        let source = Arc::new(DynamoDbTable::new(dynamodb.clone()));
        let report = Pipeline::new(
            Arc::clone(&source),
            store(&s3),
            config(Action::Backup, &source_name, &bucket),
        )
        .backup()
        .await
        .unwrap();
        assert_eq!(report.sink.records, 30);
        assert!(report.sink.objects.len() > 1);

        let target = Arc::new(DynamoDbTable::new(dynamodb.clone()));
        let report = Pipeline::new(
            Arc::clone(&target),
            store(&s3),
            config(Action::Restore, &target_name, &bucket),
        )
        .restore()
        .await
        .unwrap();
        assert_eq!(report.writer.records, 30);

        let scanned = dynamodb
            .scan()
            .table_name(&target_name)
            .send()
            .await
            .unwrap();
        assert_eq!(scanned.count(), 30);

        cleanup(&dynamodb, &s3, &[&source_name, &target_name], &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_missing_table_and_marker() {
        let dynamodb = dynamodb_client();
        let s3 = s3_client();
        let bucket = create_bucket(&s3).await;
        let table = DynamoDbTable::new(dynamodb.clone());

        let err = table
            .describe_table(&test_resource_name("missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let store = store(&s3);
        let dest = Destination::new(&bucket, "absent");
        assert!(!store.exists(&dest.success_marker()).await.unwrap());
        store
            .put_object(&dest.manifest(), Bytes::from_static(b"{}"))
            .await
            .unwrap();

        let target_name = test_resource_name("dst");
        create_table(&dynamodb, &target_name).await;
        let mut restore = config(Action::Restore, &target_name, &bucket);
        restore.folder = "absent".to_owned();
        let err = Pipeline::new(Arc::new(table), store, restore)
            .restore()
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::MissingCompletionMarker { .. }));

        cleanup(&dynamodb, &s3, &[&target_name], &bucket).await;
    }
}
