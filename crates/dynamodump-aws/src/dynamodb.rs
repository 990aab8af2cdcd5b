//! DynamoDB table backend.

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{PutRequest, ReturnConsumedCapacity, WriteRequest};
use dynamodump_core::TableBackend;
use dynamodump_model::{
    BatchPutOutput, Item, ScanPage, ScanRequest, TableError, TableStatus, TableSummary,
};
use tracing::debug;

use crate::convert::{from_sdk_item, table_error, to_sdk_item};

/// A [`TableBackend`] backed by the DynamoDB service.
#[derive(Debug, Clone)]
pub struct DynamoDbTable {
    client: Client,
}

impl DynamoDbTable {
    /// Wrap a configured client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TableBackend for DynamoDbTable {
    async fn scan_page(&self, request: &ScanRequest) -> Result<ScanPage, TableError> {
        let start_key = request.exclusive_start_key.as_ref().map(to_sdk_item);
        let output = self
            .client
            .scan()
            .table_name(&request.table_name)
            .set_limit(request.limit)
            .set_exclusive_start_key(start_key)
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(table_error)?;

        let items = output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(from_sdk_item)
            .collect::<Result<Vec<_>, _>>()?;
        let last_evaluated_key = match output.last_evaluated_key {
            Some(key) if !key.is_empty() => Some(from_sdk_item(key)?),
            _ => None,
        };

        Ok(ScanPage {
            items,
            last_evaluated_key,
            consumed_capacity: output.consumed_capacity.and_then(|c| c.capacity_units),
        })
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableSummary, TableError> {
        let output = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(table_error)?;

        let table = output
            .table
            .ok_or_else(|| TableError::internal_error("DescribeTable returned no table"))?;
        let status = TableStatus::from(table.table_status.as_ref().map_or("", |s| s.as_str()));

        Ok(TableSummary {
            table_name: table.table_name.unwrap_or_else(|| table_name.to_owned()),
            status,
            item_count: table.item_count.unwrap_or_default(),
        })
    }

    async fn batch_put(
        &self,
        table_name: &str,
        items: &[Item],
    ) -> Result<BatchPutOutput, TableError> {
        let requests = items
            .iter()
            .map(|item| {
                let put = PutRequest::builder()
                    .set_item(Some(to_sdk_item(item)))
                    .build()
                    .map_err(|e| TableError::validation(e.to_string()))?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>, TableError>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table_name, requests)
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(table_error)?;

        let unprocessed_items = output
            .unprocessed_items
            .unwrap_or_default()
            .remove(table_name)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|request| request.put_request.map(|put| put.item))
            .map(from_sdk_item)
            .collect::<Result<Vec<_>, _>>()?;
        let consumed_capacity = output.consumed_capacity.map(|all| {
            all.iter()
                .filter_map(|c| c.capacity_units)
                .sum::<f64>()
        });
        debug!(
            table = %table_name,
            items = items.len(),
            unprocessed = unprocessed_items.len(),
            "batch write response"
        );

        Ok(BatchPutOutput {
            unprocessed_items,
            consumed_capacity,
        })
    }
}
