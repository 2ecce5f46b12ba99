//! Concept Writer.

use std::collections::HashMap;

use csi_core::{generate_id, ImportedConcept};
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ImportError, Result};
use crate::sql::InsertBuilder;

/// Upserts a batch of concepts into the `coding` table.
///
/// Each concept is upserted under `mergeOnConflict(["system","code"])`: a
/// re-import with a changed `display` refreshes it. Processing order matches
/// input order; because the operation is an upsert, order does not affect
/// the final state.
///
/// Returns the in-batch index `code -> coding id`, used by the Property
/// Writer to resolve references to concepts introduced in this same batch
/// without a round trip.
///
/// Concepts with an empty `code` are rejected by the outer schema validator
/// before reaching this component; this writer trusts its input.
#[instrument(skip(conn, concepts), fields(count = concepts.len()))]
pub async fn write_concepts(
    conn: &mut PgConnection,
    system_id: Uuid,
    concepts: &[ImportedConcept],
) -> Result<HashMap<String, Uuid>> {
    let insert_sql = InsertBuilder::new("coding", &["id", "system", "code", "display"])?
        .on_conflict_merge(&["system", "code"])?
        .returning("id")?
        .to_sql();

    let mut index = HashMap::with_capacity(concepts.len());

    for concept in concepts {
        let candidate_id = generate_id();
        let (id,): (Uuid,) = query_as(&insert_sql)
            .bind(candidate_id)
            .bind(system_id)
            .bind(&concept.code)
            .bind(&concept.display)
            .fetch_one(&mut *conn)
            .await
            .map_err(ImportError::from)?;

        index.insert(concept.code.clone(), id);
    }

    Ok(index)
}
