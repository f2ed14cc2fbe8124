//! Maps SDK failures onto [`ServiceError`].

use aws_sdk_dynamodb::error::{BuildError, ProvideErrorMetadata, SdkError};

use tablesync_core::service::{ServiceError, ServiceErrorKind};

/// Maps an SDK error using its typed variant and, for service errors, the
/// error code reported by DynamoDB.
pub fn map_sdk_error<E, R>(err: SdkError<E, R>) -> ServiceError
where
    E: ProvideErrorMetadata + std::fmt::Debug + std::fmt::Display,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::DispatchFailure(dispatch) if dispatch.is_timeout() => ServiceError::new(
            ServiceErrorKind::Connection,
            "Connection timed out to DynamoDB. Check your network or endpoint.",
        ),
        SdkError::DispatchFailure(_) => ServiceError::new(
            ServiceErrorKind::Connection,
            "Connection failed to DynamoDB. Check if the endpoint is reachable.",
        ),
        SdkError::TimeoutError(_) => ServiceError::new(
            ServiceErrorKind::Connection,
            "Connection timed out to DynamoDB. Check your network or endpoint.",
        ),
        SdkError::ServiceError(service_err) => {
            let inner = service_err.err();
            let display = inner.to_string();
            map_error_code(inner.code(), inner.message().unwrap_or(&display))
        }
        _ => ServiceError::new(
            ServiceErrorKind::Other,
            format!("Unexpected DynamoDB error: {:?}", err),
        ),
    }
}

/// Maps a DynamoDB error code and message.
pub fn map_error_code(code: Option<&str>, message: &str) -> ServiceError {
    let kind = match code {
        Some("ResourceNotFoundException") => ServiceErrorKind::NotFound,
        Some("ResourceInUseException") => ServiceErrorKind::InUse,
        Some("ValidationException") => ServiceErrorKind::Validation,
        Some(
            "ProvisionedThroughputExceededException"
            | "LimitExceededException"
            | "RequestLimitExceeded"
            | "Throttling"
            | "ThrottlingException",
        ) => ServiceErrorKind::Throttled,
        _ => ServiceErrorKind::Other,
    };
    let message = match code {
        Some(code) if kind == ServiceErrorKind::Other => format!("{}: {}", code, message),
        _ => message.to_string(),
    };
    ServiceError::new(kind, message)
}

pub fn map_build_error(err: BuildError) -> ServiceError {
    ServiceError::new(
        ServiceErrorKind::Other,
        format!("Failed to build request: {}", err),
    )
}

/// Only `ResourceNotFoundException` means the table is absent.
pub fn is_missing_table(err: &ServiceError) -> bool {
    err.kind == ServiceErrorKind::NotFound
}

/// DynamoDB rejects a throughput update that changes nothing.
pub fn is_unchanged_throughput(err: &ServiceError) -> bool {
    err.kind == ServiceErrorKind::Validation && err.message.contains("will not change")
}
