//! Import Orchestrator.
//!
//! Acquires one connection from the pool for the whole call, runs the
//! Concept Writer then the Property Writer inside a single transaction, and
//! commits or rolls back as a unit: one task, one transaction, one
//! connection, with no internal parallelism. The orchestrator is also
//! responsible for the pre-transaction `CodeSystem` lookup and its
//! zero/one/many disambiguation.

use csi_core::{now_utc, CodeSystemRef, ImportedConcept, ImportedProperty};
use csi_storage::TerminologyStore;
use sqlx_postgres::PgPool;
use tracing::{info, instrument, warn};

use crate::cache::ResolutionCache;
use crate::config::PgConfig;
use crate::error::{ImportError, Result};
use crate::writer::{write_concepts, write_properties};

/// One `CodeSystem/$import` invocation.
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    /// Canonical URL of the target `CodeSystem`.
    pub system: String,
    /// Concepts to upsert, in input order.
    pub concepts: Vec<ImportedConcept>,
    /// Property values to attach, in input order.
    pub properties: Vec<ImportedProperty>,
}

/// Counters describing one completed import, surfaced to the caller and to
/// `tracing` for an end-of-call summary. The engine exports no external
/// metrics, so this is a plain in-process value rather than a gauge/counter
/// pair registered with a metrics backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub concepts_written: usize,
    pub properties_written: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Wall-clock time spent inside this call, from before the `CodeSystem`
    /// lookup to after commit.
    pub duration_ms: i64,
}

/// Runs one import batch to completion: begins a transaction, writes
/// concepts then properties, and commits. Any error rolls the transaction
/// back and is returned to the caller untouched, so a failed batch leaves
/// the database exactly as it was before the call.
///
/// The `CodeSystem` lookup happens before the transaction opens:
/// `CodeSystemNotFound`/`AmbiguousCodeSystem` are pre-transaction errors with
/// nothing to roll back.
///
/// # Errors
///
/// Returns any [`ImportError`] variant.
#[instrument(skip(pool, store, config, request), fields(system = %request.system))]
pub async fn import_code_system(
    pool: &PgPool,
    store: &dyn TerminologyStore,
    config: &PgConfig,
    request: ImportRequest,
) -> Result<(CodeSystemRef, ImportSummary)> {
    let started_at = now_utc();

    let combined = request.concepts.len() + request.properties.len();
    if combined > config.batch_size_warning {
        warn!(
            combined,
            threshold = config.batch_size_warning,
            "Import batch exceeds the soft size warning threshold; processing anyway"
        );
    }

    let code_system = resolve_code_system(store, &request.system).await?;

    let mut tx = pool.begin().await.map_err(ImportError::from)?;

    let concept_index = write_concepts(&mut tx, code_system.id, &request.concepts).await?;

    let mut cache = ResolutionCache::new();
    write_properties(
        &mut tx,
        &code_system,
        &concept_index,
        &request.properties,
        &mut cache,
    )
    .await?;

    tx.commit().await.map_err(ImportError::from)?;

    let stats = cache.stats();
    let duration_ms = (now_utc() - started_at).whole_milliseconds() as i64;
    let summary = ImportSummary {
        concepts_written: concept_index.len(),
        properties_written: request.properties.len(),
        cache_hits: stats.hits,
        cache_misses: stats.misses,
        duration_ms,
    };

    info!(
        concepts_written = summary.concepts_written,
        properties_written = summary.properties_written,
        cache_hits = summary.cache_hits,
        cache_misses = summary.cache_misses,
        duration_ms = summary.duration_ms,
        "CodeSystem/$import committed"
    );

    Ok((code_system, summary))
    // `tx` is consumed by `commit`; any earlier `?` drops it uncommitted,
    // and sqlx's `Drop` impl issues the rollback automatically.
}

/// Resolves `url` to exactly one `CodeSystem`, failing early on zero or many
/// matches — ambiguous canonical URLs are a caller error, not something this
/// engine should guess its way through.
async fn resolve_code_system(store: &dyn TerminologyStore, url: &str) -> Result<CodeSystemRef> {
    let mut matches = store.find_code_system_by_url(url).await?;

    match matches.len() {
        0 => Err(ImportError::code_system_not_found(url)),
        1 => Ok(matches.remove(0)),
        count => Err(ImportError::ambiguous_code_system(url, count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use csi_storage::StorageError;
    use uuid::Uuid;

    struct FixedStore(Vec<CodeSystemRef>);

    #[async_trait]
    impl TerminologyStore for FixedStore {
        async fn find_code_system_by_url(
            &self,
            url: &str,
        ) -> std::result::Result<Vec<CodeSystemRef>, StorageError> {
            Ok(self.0.iter().filter(|cs| cs.url == url).cloned().collect())
        }
    }

    fn code_system(url: &str) -> CodeSystemRef {
        CodeSystemRef {
            id: Uuid::new_v4(),
            url: url.to_string(),
            hierarchy_meaning: None,
            properties: vec![],
        }
    }

    #[tokio::test]
    async fn test_resolve_code_system_not_found() {
        let store = FixedStore(vec![]);
        let err = resolve_code_system(&store, "http://ex/missing").await.unwrap_err();
        assert!(matches!(err, ImportError::CodeSystemNotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_code_system_ambiguous() {
        let store = FixedStore(vec![code_system("http://ex/cs"), code_system("http://ex/cs")]);
        let err = resolve_code_system(&store, "http://ex/cs").await.unwrap_err();
        assert!(matches!(err, ImportError::AmbiguousCodeSystem { count: 2, .. }));
    }

    #[tokio::test]
    async fn test_resolve_code_system_unique_match() {
        let cs = code_system("http://ex/cs");
        let store = FixedStore(vec![cs.clone()]);
        let resolved = resolve_code_system(&store, "http://ex/cs").await.unwrap();
        assert_eq!(resolved.id, cs.id);
    }
}
