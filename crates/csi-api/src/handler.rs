//! The `CodeSystem/$import` operation handler.
//!
//! Marshals the external Parameters-shaped (or simplified flat JSON) request
//! body into an [`ImportRequest`], enforces the authorization gate, and
//! drives [`csi_db_postgres::import_code_system`].

use async_trait::async_trait;
use csi_core::{validate_canonical_url, validate_code, ImportedConcept, ImportedProperty};
use csi_db_postgres::{import_code_system, ImportError, ImportRequest, PgConfig};
use csi_storage::TerminologyStore;
use serde_json::Value;
use sqlx_postgres::PgPool;
use tracing::{instrument, warn};

use crate::error::OperationError;

/// Trait implemented by operation handlers exposed at the external seam.
///
/// Only the levels meaningful to `CodeSystem/$import` are given non-default
/// bodies; the rest inherit the `NotSupported` defaults, since the operation
/// has no meaningful instance-level form.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Returns the operation code without the `$` prefix.
    fn code(&self) -> &str;

    /// Handles the operation at system level (`POST /$import`).
    async fn handle_system(
        &self,
        _params: &Value,
        _caller_is_privileged: bool,
    ) -> Result<Value, OperationError> {
        Err(OperationError::NotSupported(format!(
            "Operation ${} is not supported at system level",
            self.code()
        )))
    }

    /// Handles the operation at type level (`POST /CodeSystem/$import`).
    async fn handle_type(
        &self,
        _resource_type: &str,
        _params: &Value,
        _caller_is_privileged: bool,
    ) -> Result<Value, OperationError> {
        Err(OperationError::NotSupported(format!(
            "Operation ${} is not supported at type level",
            self.code()
        )))
    }
}

/// The `CodeSystem/$import` operation handler.
pub struct ImportOperation {
    pool: PgPool,
    store: Box<dyn TerminologyStore>,
    config: PgConfig,
}

impl ImportOperation {
    #[must_use]
    pub fn new(pool: PgPool, store: Box<dyn TerminologyStore>, config: PgConfig) -> Self {
        Self { pool, store, config }
    }

    /// Runs the operation: authorization gate, parameter parsing, and the
    /// orchestrator call, returning the resolved CodeSystem as the `return`
    /// out parameter.
    #[instrument(skip(self, params), fields(caller_is_privileged))]
    async fn run(&self, params: &Value, caller_is_privileged: bool) -> Result<Value, OperationError> {
        if !caller_is_privileged {
            let err = ImportError::AuthorizationFailure;
            warn!(category = ?err.category(), "{err}");
            return Err(OperationError::from(err));
        }

        let request = parse_import_request(params)?;

        let (code_system, summary) = import_code_system(&self.pool, self.store.as_ref(), &self.config, request)
            .await
            .map_err(|err| {
                warn!(category = ?err.category(), "CodeSystem/$import failed: {err}");
                OperationError::from(err)
            })?;

        tracing::info!(
            system = %code_system.url,
            concepts_written = summary.concepts_written,
            properties_written = summary.properties_written,
            "CodeSystem/$import completed"
        );

        Ok(serde_json::json!({
            "resourceType": "CodeSystem",
            "id": code_system.id.to_string(),
            "url": code_system.url,
        }))
    }
}

#[async_trait]
impl OperationHandler for ImportOperation {
    fn code(&self) -> &str {
        "import"
    }

    async fn handle_system(
        &self,
        params: &Value,
        caller_is_privileged: bool,
    ) -> Result<Value, OperationError> {
        self.run(params, caller_is_privileged).await
    }

    async fn handle_type(
        &self,
        resource_type: &str,
        params: &Value,
        caller_is_privileged: bool,
    ) -> Result<Value, OperationError> {
        if resource_type != "CodeSystem" {
            return Err(OperationError::NotSupported(format!(
                "${} is only supported on CodeSystem",
                self.code()
            )));
        }
        self.run(params, caller_is_privileged).await
    }
}

/// Parses the operation's input parameters from either a FHIR `Parameters`
/// resource or a simplified flat JSON body.
///
/// Accepted shapes:
///
/// ```json
/// {"resourceType": "Parameters", "parameter": [
///   {"name": "system", "valueUri": "http://ex/cs"},
///   {"name": "concept", "part": [{"name": "code", "valueCode": "A"}]},
///   {"name": "property", "part": [
///     {"name": "code", "valueCode": "A"},
///     {"name": "property", "valueCode": "parent"},
///     {"name": "value", "valueString": "B"}
///   ]}
/// ]}
/// ```
///
/// ```json
/// {"system": "http://ex/cs", "concept": [{"code": "A"}], "property": [
///   {"code": "A", "property": "parent", "value": "B"}
/// ]}
/// ```
fn parse_import_request(params: &Value) -> Result<ImportRequest, OperationError> {
    let request = if let Some(parameter) = params.get("parameter").and_then(Value::as_array) {
        parse_fhir_parameters(parameter)
    } else if params.get("system").is_some() {
        parse_flat_json(params)
    } else {
        Err(OperationError::InvalidParameters(
            "Request must contain 'parameter' (FHIR Parameters) or a flat 'system'/'concept'/'property' body".to_string(),
        ))
    }?;

    validate_request(&request)?;
    Ok(request)
}

/// The outer schema validator spec §4.4 refers to: rejects malformed
/// `system`/`concept`/`property` values before they reach the writers, which
/// trust their input.
fn validate_request(request: &ImportRequest) -> Result<(), OperationError> {
    validate_canonical_url(&request.system)?;
    for concept in &request.concepts {
        validate_code(&concept.code)?;
    }
    for property in &request.properties {
        validate_code(&property.code)?;
    }
    Ok(())
}

fn parse_fhir_parameters(parameter: &[Value]) -> Result<ImportRequest, OperationError> {
    let mut system = None;
    let mut concepts = Vec::new();
    let mut properties = Vec::new();

    for param in parameter {
        let name = param.get("name").and_then(Value::as_str).unwrap_or_default();
        match name {
            "system" => {
                system = param
                    .get("valueUri")
                    .or_else(|| param.get("valueUrl"))
                    .or_else(|| param.get("valueString"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            "concept" => concepts.push(parse_concept_part(param)?),
            "property" => properties.push(parse_property_part(param)?),
            _ => {}
        }
    }

    let system = system.ok_or_else(|| {
        OperationError::InvalidParameters("'system' parameter is required".to_string())
    })?;

    Ok(ImportRequest { system, concepts, properties })
}

fn parse_concept_part(param: &Value) -> Result<ImportedConcept, OperationError> {
    let parts = param.get("part").and_then(Value::as_array).ok_or_else(|| {
        OperationError::InvalidParameters("'concept' parameter requires 'part'".to_string())
    })?;

    let mut code = None;
    let mut display = None;
    for part in parts {
        match part.get("name").and_then(Value::as_str).unwrap_or_default() {
            "code" => {
                code = part
                    .get("valueCode")
                    .or_else(|| part.get("valueString"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            "display" => {
                display = part
                    .get("valueString")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            _ => {}
        }
    }

    let code = code.ok_or_else(|| {
        OperationError::InvalidParameters("each 'concept' requires a 'code' part".to_string())
    })?;

    Ok(ImportedConcept { code, display })
}

fn parse_property_part(param: &Value) -> Result<ImportedProperty, OperationError> {
    let parts = param.get("part").and_then(Value::as_array).ok_or_else(|| {
        OperationError::InvalidParameters("'property' parameter requires 'part'".to_string())
    })?;

    let mut code = None;
    let mut property = None;
    let mut value = None;
    for part in parts {
        let text = part
            .get("valueString")
            .or_else(|| part.get("valueCode"))
            .and_then(Value::as_str)
            .map(str::to_string);

        match part.get("name").and_then(Value::as_str).unwrap_or_default() {
            "code" => code = text,
            "property" => property = text,
            "value" => value = text,
            _ => {}
        }
    }

    match (code, property, value) {
        (Some(code), Some(property), Some(value)) => Ok(ImportedProperty { code, property, value }),
        _ => Err(OperationError::InvalidParameters(
            "each 'property' requires 'code', 'property', and 'value' parts".to_string(),
        )),
    }
}

fn parse_flat_json(params: &Value) -> Result<ImportRequest, OperationError> {
    let system = params
        .get("system")
        .and_then(Value::as_str)
        .ok_or_else(|| OperationError::InvalidParameters("'system' is required".to_string()))?
        .to_string();

    let concepts = match params.get("concept") {
        Some(value) => serde_json::from_value(value.clone()).map_err(|err| {
            OperationError::InvalidParameters(format!("invalid 'concept' array: {err}"))
        })?,
        None => Vec::new(),
    };

    let properties = match params.get("property") {
        Some(value) => serde_json::from_value(value.clone()).map_err(|err| {
            OperationError::InvalidParameters(format!("invalid 'property' array: {err}"))
        })?,
        None => Vec::new(),
    };

    Ok(ImportRequest { system, concepts, properties })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_flat_json_minimal() {
        let body = json!({"system": "http://ex/cs"});
        let req = parse_import_request(&body).unwrap();
        assert_eq!(req.system, "http://ex/cs");
        assert!(req.concepts.is_empty());
        assert!(req.properties.is_empty());
    }

    #[test]
    fn test_parse_flat_json_with_concepts_and_properties() {
        let body = json!({
            "system": "http://ex/cs",
            "concept": [{"code": "A"}, {"code": "B", "display": "Bee"}],
            "property": [{"code": "B", "property": "parent", "value": "A"}],
        });
        let req = parse_import_request(&body).unwrap();
        assert_eq!(req.concepts.len(), 2);
        assert_eq!(req.concepts[1].display.as_deref(), Some("Bee"));
        assert_eq!(req.properties.len(), 1);
        assert_eq!(req.properties[0].property, "parent");
    }

    #[test]
    fn test_parse_fhir_parameters_shape() {
        let body = json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "system", "valueUri": "http://ex/cs"},
                {"name": "concept", "part": [
                    {"name": "code", "valueCode": "A"},
                ]},
                {"name": "property", "part": [
                    {"name": "code", "valueCode": "A"},
                    {"name": "property", "valueCode": "severity"},
                    {"name": "value", "valueString": "high"},
                ]},
            ]
        });

        let req = parse_import_request(&body).unwrap();
        assert_eq!(req.system, "http://ex/cs");
        assert_eq!(req.concepts[0].code, "A");
        assert_eq!(req.properties[0].value, "high");
    }

    #[test]
    fn test_missing_system_is_rejected() {
        let body = json!({"concept": [{"code": "A"}]});
        assert!(parse_import_request(&body).is_err());
    }

    #[test]
    fn test_concept_part_without_code_is_rejected() {
        let param = json!({"name": "concept", "part": [{"name": "display", "valueString": "x"}]});
        assert!(parse_concept_part(&param).is_err());
    }

    #[test]
    fn test_malformed_system_url_is_rejected() {
        let body = json!({"system": "not-a-url"});
        assert!(parse_import_request(&body).is_err());
    }

    #[test]
    fn test_empty_concept_code_is_rejected() {
        let body = json!({
            "system": "http://ex/cs",
            "concept": [{"code": ""}],
        });
        assert!(parse_import_request(&body).is_err());
    }

    #[test]
    fn test_empty_property_code_is_rejected() {
        let body = json!({
            "system": "http://ex/cs",
            "property": [{"code": "", "property": "parent", "value": "A"}],
        });
        assert!(parse_import_request(&body).is_err());
    }
}
