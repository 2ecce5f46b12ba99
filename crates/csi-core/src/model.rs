//! Domain value types shared by the storage and engine layers.
//!
//! These mirror the persistent/transient entities of the data model: a
//! read-only view of a `CodeSystem` and its declared property definitions,
//! and the transient payload of one `$import` batch.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Validates a concept or property code is non-empty.
///
/// This is the "outer schema validator" spec §4.4 refers to: the Concept
/// Writer and Property Writer trust their input, so malformed codes must be
/// rejected before a batch reaches them (see `csi_api::handler`).
pub fn validate_code(code: &str) -> Result<()> {
    if code.is_empty() {
        Err(CoreError::EmptyCode)
    } else {
        Ok(())
    }
}

/// Validates that `url` looks like a canonical URL (non-empty, with a scheme
/// separator), rejecting the empty-or-bare-word inputs that would otherwise
/// reach the storage lookup and fail there with a less specific diagnostic.
pub fn validate_canonical_url(url: &str) -> Result<()> {
    if url.is_empty() || !url.contains("://") {
        Err(CoreError::InvalidUrl(url.to_string()))
    } else {
        Ok(())
    }
}

/// A property definition declared on a `CodeSystem` resource.
///
/// Declared definitions live on the external `CodeSystem` resource, not in
/// this engine's tables; the engine only reads them to drive resolution and,
/// when a code is missing from this list, to decide whether implicit parent
/// semantics apply (see [`crate::model::CodeSystemRef::hierarchy_meaning`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub code: String,
    pub uri: String,
    /// The value `"code"` marks a relationship property; any other value
    /// marks a plain attribute.
    #[serde(rename = "type")]
    pub prop_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyDef {
    #[must_use]
    pub fn new(code: impl Into<String>, uri: impl Into<String>, prop_type: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            uri: uri.into(),
            prop_type: prop_type.into(),
            description: None,
        }
    }

    /// Whether this property definition classifies as a relationship.
    ///
    /// This is the single dispatch signal the Property Writer uses to decide
    /// whether to resolve a `target` coding for an imported value.
    #[must_use]
    pub fn is_relationship(&self) -> bool {
        self.prop_type == "code"
    }

    /// Synthesizes the implicit "parent" relationship definition.
    ///
    /// Used by the resolver when a requested property code is not declared
    /// but satisfies the implicit-parent rule.
    #[must_use]
    pub fn implicit_parent(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            uri: "http://hl7.org/fhir/concept-properties#parent".to_string(),
            prop_type: "code".to_string(),
            description: None,
        }
    }
}

/// A read-only reference to the `CodeSystem` an import targets.
///
/// Owned and mutated entirely outside this engine; the engine only ever
/// reads one of these, resolved by canonical URL before the transaction
/// opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSystemRef {
    pub id: Uuid,
    pub url: String,
    pub hierarchy_meaning: Option<String>,
    pub properties: Vec<PropertyDef>,
}

impl CodeSystemRef {
    /// Looks up a declared property definition by code.
    #[must_use]
    pub fn declared_property(&self, code: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.code == code)
    }
}

/// One concept to upsert as part of an import batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedConcept {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// One property value to attach to a concept as part of an import batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedProperty {
    /// Code of the concept this property is attached to.
    pub code: String,
    /// Code of the property definition (possibly implicit `parent`).
    pub property: String,
    /// Textual value; for relationships, the target concept's code.
    pub value: String,
}
