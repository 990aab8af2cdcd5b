//! Conversions between dynamodump values and DynamoDB SDK values.

use std::collections::HashMap;

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue as SdkValue;
use bytes::Bytes;
use dynamodump_model::{AttributeValue, Item, TableError, TableErrorCode};

/// SDK item shape.
pub type SdkItem = HashMap<String, SdkValue>;

/// Convert a value into its SDK form.
#[must_use]
pub fn to_sdk_value(value: &AttributeValue) -> SdkValue {
    match value {
        AttributeValue::B(b) => SdkValue::B(Blob::new(b.to_vec())),
        AttributeValue::Bool(b) => SdkValue::Bool(*b),
        AttributeValue::Bs(set) => {
            SdkValue::Bs(set.iter().map(|b| Blob::new(b.to_vec())).collect())
        }
        AttributeValue::N(n) => SdkValue::N(n.clone()),
        AttributeValue::Ns(set) => SdkValue::Ns(set.clone()),
        AttributeValue::Null(b) => SdkValue::Null(*b),
        AttributeValue::S(s) => SdkValue::S(s.clone()),
        AttributeValue::Ss(set) => SdkValue::Ss(set.clone()),
        AttributeValue::L(list) => SdkValue::L(list.iter().map(to_sdk_value).collect()),
        AttributeValue::M(map) => SdkValue::M(to_sdk_item(map)),
    }
}

/// Convert an SDK value. Fails on variants this SDK version does not model.
pub fn from_sdk_value(value: SdkValue) -> Result<AttributeValue, TableError> {
    Ok(match value {
        SdkValue::B(b) => AttributeValue::B(Bytes::from(b.into_inner())),
        SdkValue::Bool(b) => AttributeValue::Bool(b),
        SdkValue::Bs(set) => {
            AttributeValue::Bs(set.into_iter().map(|b| Bytes::from(b.into_inner())).collect())
        }
        SdkValue::N(n) => AttributeValue::N(n),
        SdkValue::Ns(set) => AttributeValue::Ns(set),
        SdkValue::Null(b) => AttributeValue::Null(b),
        SdkValue::S(s) => AttributeValue::S(s),
        SdkValue::Ss(set) => AttributeValue::Ss(set),
        SdkValue::L(list) => AttributeValue::L(
            list.into_iter()
                .map(from_sdk_value)
                .collect::<Result<_, _>>()?,
        ),
        SdkValue::M(map) => AttributeValue::M(from_sdk_item(map)?),
        other => {
            return Err(TableError::validation(format!(
                "unsupported attribute value type: {other:?}"
            )));
        }
    })
}

/// Convert an item into its SDK form.
#[must_use]
pub fn to_sdk_item(item: &Item) -> SdkItem {
    item.iter()
        .map(|(name, value)| (name.clone(), to_sdk_value(value)))
        .collect()
}

/// Convert an SDK item.
pub fn from_sdk_item(item: SdkItem) -> Result<Item, TableError> {
    item.into_iter()
        .map(|(name, value)| Ok((name, from_sdk_value(value)?)))
        .collect()
}

/// Map a failed SDK call onto a [`TableError`], keeping the service error code.
pub fn table_error<E, R>(err: SdkError<E, R>) -> TableError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let code = err.code().map(ToOwned::to_owned);
    let message = err
        .message()
        .map_or_else(|| DisplayErrorContext(&err).to_string(), ToOwned::to_owned);
    table_error_from_parts(code.as_deref(), message).with_source(err)
}

/// Build a [`TableError`] from a service error code and message.
#[must_use]
pub fn table_error_from_parts(code: Option<&str>, message: impl Into<String>) -> TableError {
    let code = code.map_or(TableErrorCode::Unknown, TableErrorCode::from_code);
    TableError::with_message(code, message)
}
