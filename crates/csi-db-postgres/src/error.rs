//! Error taxonomy for the CodeSystem Import Engine.

use csi_storage::StorageError;
use thiserror::Error;

/// Errors the import engine can surface to its caller.
///
/// Every variant maps to a structured outcome with severity `error` at the
/// external interface (see `csi_api::handler`); none is recovered locally —
/// any error raised inside the transaction causes the whole batch to roll
/// back.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Zero CodeSystems matched the requested canonical URL.
    #[error("CodeSystem not found: {url}")]
    CodeSystemNotFound { url: String },

    /// More than one CodeSystem matched the requested canonical URL.
    #[error("Ambiguous CodeSystem reference: {url} matched {count} systems")]
    AmbiguousCodeSystem { url: String, count: usize },

    /// A property referenced a concept code absent from this system.
    #[error("Unknown code: {system_url}|{code}")]
    UnknownCode { system_url: String, code: String },

    /// A property code is neither declared nor an implicit parent.
    #[error("Unknown property: {code}")]
    UnknownProperty { code: String },

    /// Any database error surfaced while the transaction was open.
    #[error("Storage failure: {message}")]
    StorageFailure { message: String },

    /// The caller does not hold the elevated privilege this operation requires.
    #[error("Caller is not authorized to perform CodeSystem/$import")]
    AuthorizationFailure,
}

impl ImportError {
    #[must_use]
    pub fn code_system_not_found(url: impl Into<String>) -> Self {
        Self::CodeSystemNotFound { url: url.into() }
    }

    #[must_use]
    pub fn ambiguous_code_system(url: impl Into<String>, count: usize) -> Self {
        Self::AmbiguousCodeSystem {
            url: url.into(),
            count,
        }
    }

    #[must_use]
    pub fn unknown_code(system_url: impl Into<String>, code: impl Into<String>) -> Self {
        Self::UnknownCode {
            system_url: system_url.into(),
            code: code.into(),
        }
    }

    #[must_use]
    pub fn unknown_property(code: impl Into<String>) -> Self {
        Self::UnknownProperty { code: code.into() }
    }

    #[must_use]
    pub fn storage_failure(message: impl Into<String>) -> Self {
        Self::StorageFailure {
            message: message.into(),
        }
    }

    /// Classifies this error for logging/monitoring.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CodeSystemNotFound { .. } => ErrorCategory::NotFound,
            Self::AmbiguousCodeSystem { .. } => ErrorCategory::Conflict,
            Self::UnknownCode { .. } | Self::UnknownProperty { .. } => ErrorCategory::Validation,
            Self::StorageFailure { .. } => ErrorCategory::Infrastructure,
            Self::AuthorizationFailure => ErrorCategory::Authorization,
        }
    }
}

/// Categories of import errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Validation,
    Infrastructure,
    Authorization,
}

impl From<sqlx_core::error::Error> for ImportError {
    fn from(err: sqlx_core::error::Error) -> Self {
        Self::storage_failure(err.to_string())
    }
}

impl From<StorageError> for ImportError {
    fn from(err: StorageError) -> Self {
        Self::storage_failure(err.to_string())
    }
}

/// Convenience result type for the import engine.
pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ImportError::code_system_not_found("http://ex/cs").to_string(),
            "CodeSystem not found: http://ex/cs"
        );
        assert_eq!(
            ImportError::unknown_code("http://ex/cs", "X").to_string(),
            "Unknown code: http://ex/cs|X"
        );
        assert_eq!(
            ImportError::unknown_property("severity").to_string(),
            "Unknown property: severity"
        );
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            ImportError::code_system_not_found("u").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            ImportError::ambiguous_code_system("u", 2).category(),
            ErrorCategory::Conflict
        );
        assert_eq!(ImportError::AuthorizationFailure.category(), ErrorCategory::Authorization);
    }
}
