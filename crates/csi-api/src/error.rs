//! Operation-level error type for the external collaborator seam.
//!
//! A `From<ImportError>` conversion maps every member of the import
//! engine's error taxonomy onto the matching operation-level variant, so
//! callers at the seam only ever see [`OperationError`].

use csi_core::CoreError;
use csi_db_postgres::ImportError;
use serde_json::{json, Value};

/// Error type for `CodeSystem/$import` operation failures at the seam.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// Invalid or missing parameters.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Referenced resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Operation not supported at the requested level.
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Caller lacks the elevated privilege this operation requires.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal/infrastructure error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OperationError {
    /// Renders this error as an `OperationOutcome`-shaped diagnostic, the
    /// structured outcome returned to the caller on failure.
    #[must_use]
    pub fn to_operation_outcome(&self) -> Value {
        json!({
            "resourceType": "OperationOutcome",
            "issue": [{
                "severity": "error",
                "code": self.issue_code(),
                "diagnostics": self.to_string(),
            }]
        })
    }

    fn issue_code(&self) -> &'static str {
        match self {
            Self::InvalidParameters(_) => "invalid",
            Self::NotFound(_) => "not-found",
            Self::NotSupported(_) => "not-supported",
            Self::Forbidden(_) => "forbidden",
            Self::Internal(_) => "exception",
        }
    }
}

impl From<CoreError> for OperationError {
    fn from(err: CoreError) -> Self {
        Self::InvalidParameters(err.to_string())
    }
}

impl From<ImportError> for OperationError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::CodeSystemNotFound { .. } => Self::NotFound(err.to_string()),
            ImportError::AmbiguousCodeSystem { .. } => Self::InvalidParameters(err.to_string()),
            ImportError::UnknownCode { .. } | ImportError::UnknownProperty { .. } => {
                Self::InvalidParameters(err.to_string())
            }
            ImportError::StorageFailure { .. } => Self::Internal(err.to_string()),
            ImportError::AuthorizationFailure => Self::Forbidden(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_code_maps_to_invalid_parameters() {
        let err: OperationError = CoreError::EmptyCode.into();
        assert!(matches!(err, OperationError::InvalidParameters(_)));
    }

    #[test]
    fn test_unknown_code_maps_to_invalid_parameters() {
        let err: OperationError = ImportError::unknown_code("http://ex/cs", "X").into();
        assert!(matches!(err, OperationError::InvalidParameters(_)));
    }

    #[test]
    fn test_storage_failure_maps_to_internal() {
        let err: OperationError = ImportError::storage_failure("connection reset").into();
        assert!(matches!(err, OperationError::Internal(_)));
    }

    #[test]
    fn test_authorization_failure_maps_to_forbidden() {
        let err: OperationError = ImportError::AuthorizationFailure.into();
        assert!(matches!(err, OperationError::Forbidden(_)));
    }

    #[test]
    fn test_operation_outcome_shape() {
        let err = OperationError::NotFound("CodeSystem not found: http://ex/cs".to_string());
        let outcome = err.to_operation_outcome();
        assert_eq!(outcome["resourceType"], "OperationOutcome");
        assert_eq!(outcome["issue"][0]["severity"], "error");
        assert_eq!(outcome["issue"][0]["code"], "not-found");
    }
}
