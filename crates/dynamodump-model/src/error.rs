//! Table backend error types.
//!
//! Every [`crate::types`] operation on a table backend fails with a
//! [`TableError`]. The error code decides how the pipeline reacts: throttling
//! codes are retried where they occur, everything else is fatal.

use std::fmt;

/// Well-known DynamoDB error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TableErrorCode {
    /// Table not found.
    ResourceNotFoundException,
    /// Table is being created, updated or deleted.
    ResourceInUseException,
    /// Provisioned throughput exceeded.
    ProvisionedThroughputExceededException,
    /// Request limit exceeded.
    RequestLimitExceeded,
    /// Generic throttling.
    ThrottlingException,
    /// Item collection size limit exceeded.
    ItemCollectionSizeLimitExceededException,
    /// Validation error.
    ValidationException,
    /// Access denied.
    AccessDeniedException,
    /// Internal server error.
    InternalServerError,
    /// Anything the backend reports that is not listed above.
    #[default]
    Unknown,
}

impl TableErrorCode {
    /// Map a service error code string onto a known code.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "ResourceNotFoundException" => Self::ResourceNotFoundException,
            "ResourceInUseException" => Self::ResourceInUseException,
            "ProvisionedThroughputExceededException" => {
                Self::ProvisionedThroughputExceededException
            }
            "RequestLimitExceeded" => Self::RequestLimitExceeded,
            "ThrottlingException" => Self::ThrottlingException,
            "ItemCollectionSizeLimitExceededException" => {
                Self::ItemCollectionSizeLimitExceededException
            }
            "ValidationException" => Self::ValidationException,
            "AccessDeniedException" => Self::AccessDeniedException,
            "InternalServerError" => Self::InternalServerError,
            _ => Self::Unknown,
        }
    }

    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceNotFoundException => "ResourceNotFoundException",
            Self::ResourceInUseException => "ResourceInUseException",
            Self::ProvisionedThroughputExceededException => {
                "ProvisionedThroughputExceededException"
            }
            Self::RequestLimitExceeded => "RequestLimitExceeded",
            Self::ThrottlingException => "ThrottlingException",
            Self::ItemCollectionSizeLimitExceededException => {
                "ItemCollectionSizeLimitExceededException"
            }
            Self::ValidationException => "ValidationException",
            Self::AccessDeniedException => "AccessDeniedException",
            Self::InternalServerError => "InternalServerError",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the backend is asking the caller to slow down.
    #[must_use]
    pub fn is_throttling(&self) -> bool {
        matches!(
            self,
            Self::ProvisionedThroughputExceededException
                | Self::RequestLimitExceeded
                | Self::ThrottlingException
        )
    }
}

impl fmt::Display for TableErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error reported by a table backend.
#[derive(Debug)]
pub struct TableError {
    /// The error code.
    pub code: TableErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl TableError {
    /// Create a new `TableError` from an error code.
    #[must_use]
    pub fn new(code: TableErrorCode) -> Self {
        Self {
            message: code.as_str().to_owned(),
            code,
            source: None,
        }
    }

    /// Create a new `TableError` with a custom message.
    #[must_use]
    pub fn with_message(code: TableErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether this error is a recoverable throttling error.
    #[must_use]
    pub fn is_throttling(&self) -> bool {
        self.code.is_throttling()
    }

    /// Whether the table does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code == TableErrorCode::ResourceNotFoundException
    }

    // -- Convenience constructors --

    /// Table or resource not found.
    #[must_use]
    pub fn resource_not_found(message: impl Into<String>) -> Self {
        Self::with_message(TableErrorCode::ResourceNotFoundException, message)
    }

    /// Provisioned throughput exceeded.
    #[must_use]
    pub fn throughput_exceeded(message: impl Into<String>) -> Self {
        Self::with_message(
            TableErrorCode::ProvisionedThroughputExceededException,
            message,
        )
    }

    /// Validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(TableErrorCode::ValidationException, message)
    }

    /// Internal server error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(TableErrorCode::InternalServerError, message)
    }
}

/// Create a `TableError` from an error code.
///
/// # Examples
///
/// ```
/// use dynamodump_model::table_error;
/// use dynamodump_model::error::TableErrorCode;
///
/// let err = table_error!(RequestLimitExceeded);
/// assert!(err.is_throttling());
///
/// let err = table_error!(ResourceNotFoundException, "Table not found");
/// assert_eq!(err.message, "Table not found");
/// ```
#[macro_export]
macro_rules! table_error {
    ($code:ident) => {
        $crate::error::TableError::new($crate::error::TableErrorCode::$code)
    };
    ($code:ident, $msg:expr) => {
        $crate::error::TableError::with_message($crate::error::TableErrorCode::$code, $msg)
    };
}
