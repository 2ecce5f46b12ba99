//! The storage boundary this engine depends on.
//!
//! The import engine never owns `CodeSystem` resources; it only needs to
//! resolve a canonical URL to zero, one, or many matching systems before it
//! opens a transaction.

use async_trait::async_trait;

use crate::error::StorageError;
use csi_core::CodeSystemRef;

/// Read-only access to `CodeSystem` resources, keyed by canonical URL.
///
/// Implementations must return every match for `url`; callers are
/// responsible for zero/one/many disambiguation.
#[async_trait]
pub trait TerminologyStore: Send + Sync {
    /// Finds all `CodeSystem` resources whose canonical `url` equals `url`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] only for infrastructure failures; an empty
    /// `Vec` (not an error) signals "no matching CodeSystem".
    async fn find_code_system_by_url(
        &self,
        url: &str,
    ) -> Result<Vec<CodeSystemRef>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyStore;

    #[async_trait]
    impl TerminologyStore for EmptyStore {
        async fn find_code_system_by_url(
            &self,
            _url: &str,
        ) -> Result<Vec<CodeSystemRef>, StorageError> {
            Ok(vec![])
        }
    }

    fn _assert_object_safe(_: &dyn TerminologyStore) {}

    #[tokio::test]
    async fn test_empty_store_returns_no_matches() {
        let store = EmptyStore;
        let matches = store.find_code_system_by_url("http://ex/cs").await.unwrap();
        assert!(matches.is_empty());
    }
}
