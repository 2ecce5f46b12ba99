//! Property Writer.

use std::collections::HashMap;

use csi_core::{CodeSystemRef, ImportedProperty};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::cache::ResolutionCache;
use crate::error::{ImportError, Result};
use crate::resolver::resolve_property;
use crate::sql::InsertBuilder;

/// Attaches a batch of imported property values to their owning concepts.
///
/// Processes entries in input order; duplicates within the batch collapse
/// under `ignoreOnConflict`. A relationship whose target is introduced in
/// the same batch links because the Concept Writer's in-batch index
/// (`concept_index`) is consulted before falling back to a database lookup.
#[instrument(skip(conn, code_system, concept_index, properties, cache), fields(count = properties.len()))]
pub async fn write_properties(
    conn: &mut PgConnection,
    code_system: &CodeSystemRef,
    concept_index: &HashMap<String, Uuid>,
    properties: &[ImportedProperty],
    cache: &mut ResolutionCache,
) -> Result<()> {
    for imported in properties {
        let coding_id = locate_concept(conn, code_system.id, concept_index, &imported.code)
            .await?
            .ok_or_else(|| ImportError::unknown_code(&code_system.url, &imported.code))?;

        let resolved = match cache.get(&code_system.url, &imported.property) {
            Some(resolved) => resolved,
            None => {
                let resolved = resolve_property(conn, code_system, &imported.property).await?;
                cache.insert(&code_system.url, &imported.property, resolved);
                resolved
            }
        };

        let target = if resolved.is_relationship {
            locate_concept(conn, code_system.id, concept_index, &imported.value).await?
        } else {
            None
        };

        insert_property_value(conn, coding_id, resolved.id, &imported.value, target).await?;
    }

    Ok(())
}

/// Locates a concept's `coding` row id: first in this batch's in-memory
/// index, then by a database lookup scoped to the current transaction (so
/// pre-existing concepts not in this batch are still resolvable).
async fn locate_concept(
    conn: &mut PgConnection,
    system_id: Uuid,
    concept_index: &HashMap<String, Uuid>,
    code: &str,
) -> Result<Option<Uuid>> {
    if let Some(&id) = concept_index.get(code) {
        return Ok(Some(id));
    }

    let row: Option<(Uuid,)> = query_as("SELECT id FROM coding WHERE system = $1 AND code = $2")
        .bind(system_id)
        .bind(code)
        .fetch_optional(&mut *conn)
        .await
        .map_err(ImportError::from)?;

    Ok(row.map(|(id,)| id))
}

/// Inserts one `coding_property` row under `ignoreOnConflict`. `target` is
/// `None` when the property is an attribute, or when it is a relationship
/// whose value does not (yet) name a resolvable concept.
async fn insert_property_value(
    conn: &mut PgConnection,
    coding_id: Uuid,
    property_id: Uuid,
    value: &str,
    target: Option<Uuid>,
) -> Result<()> {
    let sql = InsertBuilder::new("coding_property", &["coding", "property", "value", "target"])?
        .on_conflict_ignore()
        .to_sql();

    query(&sql)
        .bind(coding_id)
        .bind(property_id)
        .bind(value)
        .bind(target)
        .execute(&mut *conn)
        .await
        .map_err(ImportError::from)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_batch_index_takes_priority() {
        let mut index = HashMap::new();
        let batch_id = Uuid::new_v4();
        index.insert("A".to_string(), batch_id);
        assert_eq!(index.get("A").copied(), Some(batch_id));
    }
}
