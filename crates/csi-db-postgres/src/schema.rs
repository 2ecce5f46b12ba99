//! Schema definition and migration for the import engine's own tables.
//!
//! The engine owns exactly three tables: `coding`, `code_system_property`,
//! and `coding_property`. `CodeSystem` itself is external and read-only to
//! this crate (see [`crate::storage`]).

use sqlx_core::query::query;
use sqlx_postgres::PgPool;
use tracing::{debug, instrument};

use crate::error::{ImportError, Result};

const CREATE_CODING: &str = r#"
CREATE TABLE IF NOT EXISTS coding (
    id UUID PRIMARY KEY,
    system UUID NOT NULL,
    code TEXT NOT NULL,
    display TEXT,
    UNIQUE (system, code)
)"#;

const CREATE_CODE_SYSTEM_PROPERTY: &str = r#"
CREATE TABLE IF NOT EXISTS code_system_property (
    id UUID PRIMARY KEY,
    system UUID NOT NULL,
    code TEXT NOT NULL,
    type TEXT NOT NULL,
    uri TEXT NOT NULL,
    description TEXT,
    UNIQUE (system, code)
)"#;

const CREATE_CODING_PROPERTY: &str = r#"
CREATE TABLE IF NOT EXISTS coding_property (
    coding UUID NOT NULL REFERENCES coding(id),
    property UUID NOT NULL REFERENCES code_system_property(id),
    value TEXT NOT NULL,
    target UUID REFERENCES coding(id),
    UNIQUE (coding, property, value)
)"#;

/// Creates the engine's tables if they do not already exist.
///
/// The schema is small and stable enough to create directly here rather
/// than through a `sqlx-cli` migration pipeline.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    query(CREATE_CODING)
        .execute(pool)
        .await
        .map_err(ImportError::from)?;
    query(CREATE_CODE_SYSTEM_PROPERTY)
        .execute(pool)
        .await
        .map_err(ImportError::from)?;
    query(CREATE_CODING_PROPERTY)
        .execute(pool)
        .await
        .map_err(ImportError::from)?;

    debug!("Import engine schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddl_references_expected_tables() {
        assert!(CREATE_CODING.contains("coding"));
        assert!(CREATE_CODE_SYSTEM_PROPERTY.contains("code_system_property"));
        assert!(CREATE_CODING_PROPERTY.contains("coding_property"));
    }
}
