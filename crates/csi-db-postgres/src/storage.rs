//! PostgreSQL implementation of [`TerminologyStore`].
//!
//! `CodeSystem` resources themselves live outside this engine's write path;
//! this module only reads the subset of a `CodeSystem` the engine needs
//! (`id`, `url`, `hierarchyMeaning`, declared `property` list) out of the
//! host's conformance resource table.

use async_trait::async_trait;
use csi_core::{CodeSystemRef, PropertyDef};
use csi_storage::{StorageError, TerminologyStore};
use serde_json::Value;
use sqlx_core::query_as::query_as;
use sqlx_postgres::PgPool;
use tracing::instrument;
use uuid::Uuid;

/// Reads `CodeSystem` resources from the host's `octofhir.codesystem` table.
///
/// The engine never writes through this store; it exists solely to
/// resolve a canonical URL before the import transaction opens.
#[derive(Debug, Clone)]
pub struct PgTerminologyStore {
    pool: PgPool,
}

impl PgTerminologyStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TerminologyStore for PgTerminologyStore {
    #[instrument(skip(self))]
    async fn find_code_system_by_url(
        &self,
        url: &str,
    ) -> Result<Vec<CodeSystemRef>, StorageError> {
        let rows: Vec<(Uuid, Value)> = query_as(
            "SELECT id, resource FROM octofhir.codesystem WHERE url = $1",
        )
        .bind(url)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StorageError::connection_error(err.to_string()))?;

        rows.into_iter()
            .map(|(id, resource)| parse_code_system(id, &resource))
            .collect()
    }
}

/// Decodes the subset of a `CodeSystem` resource this engine needs out of
/// its stored JSON representation.
fn parse_code_system(id: Uuid, resource: &Value) -> Result<CodeSystemRef, StorageError> {
    let url = resource
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| StorageError::malformed_resource("CodeSystem is missing 'url'"))?
        .to_string();

    let hierarchy_meaning = resource
        .get("hierarchyMeaning")
        .and_then(Value::as_str)
        .map(str::to_string);

    let properties = resource
        .get("property")
        .and_then(Value::as_array)
        .map(|defs| defs.iter().map(parse_property_def).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();

    Ok(CodeSystemRef {
        id,
        url,
        hierarchy_meaning,
        properties,
    })
}

fn parse_property_def(value: &Value) -> Result<PropertyDef, StorageError> {
    let code = value
        .get("code")
        .and_then(Value::as_str)
        .ok_or_else(|| StorageError::malformed_resource("property definition is missing 'code'"))?
        .to_string();

    let uri = value
        .get("uri")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let prop_type = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| StorageError::malformed_resource("property definition is missing 'type'"))?
        .to_string();

    let description = value
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(PropertyDef {
        code,
        uri,
        prop_type,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_code_system_with_declared_properties() {
        let resource = json!({
            "url": "http://ex/cs",
            "hierarchyMeaning": "isa",
            "property": [
                {"code": "isa", "uri": "http://ex/isa", "type": "code"},
                {"code": "severity", "uri": "http://ex/severity", "type": "string", "description": "Severity"},
            ],
        });

        let cs = parse_code_system(Uuid::new_v4(), &resource).unwrap();
        assert_eq!(cs.url, "http://ex/cs");
        assert_eq!(cs.hierarchy_meaning.as_deref(), Some("isa"));
        assert_eq!(cs.properties.len(), 2);
        assert!(cs.declared_property("severity").unwrap().description.is_some());
    }

    #[test]
    fn test_parse_code_system_without_properties() {
        let resource = json!({"url": "http://ex/cs"});
        let cs = parse_code_system(Uuid::new_v4(), &resource).unwrap();
        assert!(cs.hierarchy_meaning.is_none());
        assert!(cs.properties.is_empty());
    }

    #[test]
    fn test_parse_code_system_missing_url_fails() {
        let resource = json!({"hierarchyMeaning": "isa"});
        assert!(parse_code_system(Uuid::new_v4(), &resource).is_err());
    }

    #[test]
    fn test_parse_property_def_missing_type_fails() {
        let value = json!({"code": "severity", "uri": "http://ex/severity"});
        assert!(parse_property_def(&value).is_err());
    }
}
