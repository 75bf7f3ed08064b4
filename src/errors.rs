//! Error types for dynox-local.
//!
//! One error enum covers the registry, the reconciliation engine, the
//! declared-table source and the SDK client. AWS SDK errors are mapped with
//! typed `SdkError` variant matching, no string parsing of debug output.

use std::time::Duration;

use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};

/// Namespace prefix DynamoDB puts in front of error codes in `__type`.
pub const ERROR_TYPE_PREFIX: &str = "com.amazonaws.dynamodb.v20120810#";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A table with this name is already registered (CREATING, ACTIVE or DELETING).
    #[error("Table already exists: {0}")]
    AlreadyExists(String),

    /// No table with this name, or it is already being deleted.
    #[error("Requested resource not found: Table: {0} not found")]
    NotFound(String),

    /// The request or table definition is malformed.
    #[error("{0}")]
    Validation(String),

    /// The request body could not be decoded.
    #[error("{0}")]
    Serialization(String),

    /// The operation named in `X-Amz-Target` is not served.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// The registry server could not be started or reached.
    #[error("Registry unavailable at {addr}: {message}")]
    RegistryUnavailable { addr: String, message: String },

    /// The declared-table source could not be read or parsed.
    #[error("Cannot read table definitions from {path}: {message}")]
    SourceUnreadable { path: String, message: String },

    /// A bounded create did not finish in time.
    #[error("Creating table {table_name} timed out after {after:?}")]
    Timeout { table_name: String, after: Duration },

    /// The SDK could not reach the endpoint.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Any other service error reported by the endpoint.
    #[error("{code}: {message}")]
    Service { code: String, message: String },
}

impl Error {
    /// DynamoDB error code used in the `__type` field of error responses.
    #[must_use]
    pub fn wire_code(&self) -> &str {
        match self {
            Error::AlreadyExists(_) => "ResourceInUseException",
            Error::NotFound(_) => "ResourceNotFoundException",
            Error::Validation(_) => "ValidationException",
            Error::Serialization(_) => "SerializationException",
            Error::UnknownOperation(_) => "UnknownOperationException",
            Error::Service { code, .. } => code.as_str(),
            Error::RegistryUnavailable { .. }
            | Error::SourceUnreadable { .. }
            | Error::Timeout { .. }
            | Error::Connection(_) => "InternalServerError",
        }
    }

    /// Client errors are answered with HTTP 400, everything else with 500.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::AlreadyExists(_)
                | Error::NotFound(_)
                | Error::Validation(_)
                | Error::Serialization(_)
                | Error::UnknownOperation(_)
        )
    }
}

// ========== TYPED ERROR MAPPING ==========

/// Map a DynamoDB service error code + message to an [`Error`].
fn map_dynamodb_code(code: Option<&str>, message: Option<&str>, display: &str, table: &str) -> Error {
    match code {
        Some("ResourceInUseException") => Error::AlreadyExists(table.to_string()),
        Some("ResourceNotFoundException") => Error::NotFound(table.to_string()),
        Some("ValidationException") => Error::Validation(message.unwrap_or(display).to_string()),
        Some("SerializationException") => {
            Error::Serialization(message.unwrap_or(display).to_string())
        }
        Some("UnknownOperationException") => {
            Error::UnknownOperation(message.unwrap_or(display).to_string())
        }
        Some(other) => Error::Service {
            code: other.to_string(),
            message: message.unwrap_or(display).to_string(),
        },
        None => Error::Service {
            code: "Unknown".to_string(),
            message: message.unwrap_or(display).to_string(),
        },
    }
}

/// Map an `SdkError` from any table operation to an [`Error`].
///
/// `table` is the table the request referenced; it becomes the payload of
/// `AlreadyExists` / `NotFound`.
pub fn map_sdk_error<E, R>(err: SdkError<E, R>, table: &str) -> Error
where
    E: ProvideErrorMetadata + std::fmt::Debug + std::fmt::Display,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::DispatchFailure(dispatch) => {
            let reason = if dispatch.is_timeout() {
                "connection timed out"
            } else if dispatch.is_io() {
                "I/O error, check if the endpoint is reachable"
            } else {
                "check if the endpoint is reachable"
            };
            Error::Connection(reason.to_string())
        }
        SdkError::TimeoutError(_) => Error::Connection("connection timed out".to_string()),
        SdkError::ConstructionFailure(inner) => Error::Validation(format!(
            "Failed to build request: {:?}",
            inner
        )),
        SdkError::ResponseError(inner) => Error::Service {
            code: "InvalidResponse".to_string(),
            message: format!("{:?}", inner),
        },
        SdkError::ServiceError(service_err) => {
            let inner = service_err.err();
            map_dynamodb_code(inner.code(), inner.message(), &inner.to_string(), table)
        }
        _ => Error::Service {
            code: "Unknown".to_string(),
            message: format!("{:?}", err),
        },
    }
}
