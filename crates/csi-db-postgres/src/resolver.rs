//! Property Resolver.
//!
//! Resolves a property code against a CodeSystem's declared property list,
//! falling back to implicit "parent" hierarchy semantics, then lazily
//! persists the resulting definition as a `code_system_property` row.

use csi_core::{generate_id, CodeSystemRef, PropertyDef};
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::cache::ResolvedProperty;
use crate::error::{ImportError, Result};
use crate::sql::InsertBuilder;

/// Resolves `property_code` against `code_system`, creating its definition
/// row if this is the first time the engine has seen it.
///
/// # Errors
///
/// Returns [`ImportError::UnknownProperty`] if `property_code` is neither
/// declared nor an implicit parent. Returns [`ImportError::StorageFailure`]
/// for any database error.
#[instrument(skip(conn, code_system))]
pub async fn resolve_property(
    conn: &mut PgConnection,
    code_system: &CodeSystemRef,
    property_code: &str,
) -> Result<ResolvedProperty> {
    let def = classify_property(code_system, property_code)
        .ok_or_else(|| ImportError::unknown_property(property_code))?;

    let is_relationship = def.is_relationship();
    let id = find_or_create_property_definition(conn, code_system.id, &def).await?;

    Ok(ResolvedProperty { id, is_relationship })
}

/// Steps 1–2 of the resolution algorithm: declared lookup, then implicit
/// parent detection. Returns `None` when neither rule matches (step 3:
/// caller fails with `UnknownProperty`).
fn classify_property(code_system: &CodeSystemRef, property_code: &str) -> Option<PropertyDef> {
    if let Some(declared) = code_system.declared_property(property_code) {
        return Some(declared.clone());
    }

    let is_implicit_parent = match &code_system.hierarchy_meaning {
        Some(hierarchy_meaning) => hierarchy_meaning == property_code,
        None => property_code == "parent",
    };

    is_implicit_parent.then(|| PropertyDef::implicit_parent(property_code))
}

/// Step 4: look up or lazily create the `code_system_property` row.
///
/// Race-safe: an `INSERT ... ON CONFLICT DO NOTHING RETURNING id` that
/// returns no row means a concurrent importer won the race, so we fall back
/// to a plain `SELECT`. The unique constraint on `(system, code)` guarantees
/// exactly one row survives regardless of interleaving.
async fn find_or_create_property_definition(
    conn: &mut PgConnection,
    system_id: Uuid,
    def: &PropertyDef,
) -> Result<Uuid> {
    let insert_sql = InsertBuilder::new(
        "code_system_property",
        &["id", "system", "code", "type", "uri", "description"],
    )?
    .on_conflict_ignore()
    .returning("id")?
    .to_sql();

    let candidate_id = generate_id();
    let inserted: Option<(Uuid,)> = query_as(&insert_sql)
        .bind(candidate_id)
        .bind(system_id)
        .bind(&def.code)
        .bind(&def.prop_type)
        .bind(&def.uri)
        .bind(&def.description)
        .fetch_optional(&mut *conn)
        .await
        .map_err(ImportError::from)?;

    if let Some((id,)) = inserted {
        return Ok(id);
    }

    let existing: (Uuid,) =
        query_as("SELECT id FROM code_system_property WHERE system = $1 AND code = $2")
            .bind(system_id)
            .bind(&def.code)
            .fetch_one(&mut *conn)
            .await
            .map_err(ImportError::from)?;

    Ok(existing.0)
}
