//! Low-level domain validation errors.
//!
//! These are distinct from the storage-layer `StorageError` (csi-storage) and
//! the import taxonomy `ImportError` (csi-db-postgres): `CoreError` covers
//! malformed domain values encountered while constructing the transient
//! request types in [`crate::model`].

use thiserror::Error;

/// Errors raised while validating or constructing core domain values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A `code` field was empty where a non-empty code is required.
    #[error("Code must not be empty")]
    EmptyCode,

    /// A canonical URL failed to parse.
    #[error("Invalid canonical URL: {0}")]
    InvalidUrl(String),

    /// A UUID string failed to parse.
    #[error("Invalid identifier: {0}")]
    InvalidId(#[from] uuid::Error),
}

/// Convenience result type for core domain operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_code_message() {
        let err = CoreError::EmptyCode;
        assert_eq!(err.to_string(), "Code must not be empty");
    }

    #[test]
    fn test_invalid_id_conversion() {
        let parse_err = uuid::Uuid::parse_str("not-a-uuid").unwrap_err();
        let err: CoreError = parse_err.into();
        assert!(matches!(err, CoreError::InvalidId(_)));
    }
}
