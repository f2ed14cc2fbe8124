use std::fmt;

use thiserror::Error;

/// Broad classification of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// The table or index does not exist.
    NotFound,
    /// The table or index already exists.
    AlreadyExists,
    /// The resource is still being changed, or a table name is taken.
    InUse,
    /// The request was rejected as invalid.
    Validation,
    /// Throughput or request limits were exceeded.
    Throttled,
    /// The service could not be reached.
    Connection,
    Other,
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceErrorKind::NotFound => "Resource not found",
            ServiceErrorKind::AlreadyExists => "Resource already exists",
            ServiceErrorKind::InUse => "Resource in use",
            ServiceErrorKind::Validation => "Validation failed",
            ServiceErrorKind::Throttled => "Request limit exceeded",
            ServiceErrorKind::Connection => "Connection failed",
            ServiceErrorKind::Other => "Service error",
        };
        f.write_str(name)
    }
}

/// Error reported by a [`TableService`](super::TableService).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::NotFound, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::AlreadyExists, message)
    }

    /// Whether the failure means the resource is already there.
    ///
    /// Index collisions come back as validation failures, so the message is
    /// checked as well as the kind. A resource that is merely in use does
    /// not count: the remote is still applying an earlier change.
    pub fn is_already_exists(&self) -> bool {
        self.kind == ServiceErrorKind::AlreadyExists
            || self.message.to_lowercase().contains("already exists")
    }

    /// Whether the remote reports the resource as busy.
    pub fn is_in_use(&self) -> bool {
        self.kind == ServiceErrorKind::InUse
    }

    /// Whether the failure means the resource is gone.
    pub fn is_not_found(&self) -> bool {
        let message = self.message.to_lowercase();
        self.kind == ServiceErrorKind::NotFound
            || message.contains("not found")
            || message.contains("does not exist")
    }
}

/// Result type for [`TableService`](super::TableService) calls.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_by_kind() {
        assert!(ServiceError::already_exists("Table: dev_users").is_already_exists());
    }

    #[test]
    fn test_in_use_is_not_already_exists() {
        let error = ServiceError::new(
            ServiceErrorKind::InUse,
            "Attempt to change a resource which is still in use: Table is being updated: dev_users",
        );
        assert!(error.is_in_use());
        assert!(!error.is_already_exists());
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_already_exists_by_message() {
        let error = ServiceError::new(
            ServiceErrorKind::Validation,
            "Attempting to create an index which already exists",
        );
        assert!(error.is_already_exists());
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_not_found_by_message() {
        let error = ServiceError::new(
            ServiceErrorKind::Validation,
            "Requested resource not found: Index: ByOwner",
        );
        assert!(error.is_not_found());
    }

    #[test]
    fn test_transient_errors_are_neither() {
        let error = ServiceError::new(ServiceErrorKind::Throttled, "Subscriber limit exceeded");
        assert!(!error.is_not_found());
        assert!(!error.is_already_exists());
    }

    #[test]
    fn test_display() {
        let error = ServiceError::not_found("Table: dev_users not found");
        assert_eq!(
            error.to_string(),
            "Resource not found: Table: dev_users not found"
        );
    }
}
