//! Error type for the CodeSystem lookup boundary.

use thiserror::Error;

/// Errors raised while looking up a `CodeSystem` by canonical URL.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be reached or returned an unexpected failure.
    #[error("Storage connection error: {message}")]
    ConnectionError { message: String },

    /// A stored `CodeSystem` resource could not be decoded into a [`csi_core::CodeSystemRef`].
    #[error("Malformed CodeSystem resource: {message}")]
    MalformedResource { message: String },
}

impl StorageError {
    #[must_use]
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn malformed_resource(message: impl Into<String>) -> Self {
        Self::MalformedResource {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_message() {
        let err = StorageError::connection_error("pool exhausted");
        assert_eq!(err.to_string(), "Storage connection error: pool exhausted");
    }
}
