//! Capability manifests.
//!
//! [`ManifestFields`] is the raw record producers (module build tooling)
//! hand in. [`CapabilityManifest`] is the frozen value built from it by
//! [`ManifestValidator`](crate::validator::ManifestValidator). There is no
//! other way to obtain a manifest, so every manifest in existence has parsed
//! versions, a known capability type and well-formed schemas.
//!
//! # Immutability
//!
//! Manifest fields are private and only exposed through shared references.
//! A new version of a capability is a new manifest; [`CapabilityManifest::to_fields`]
//! gives back an editable record for building one.
//!
//! # JSON
//!
//! Both types use the producer field names (`module_id`, `capability_type`,
//! `schema_type`, `schema_definition`, ...). Deserializing a
//! [`CapabilityManifest`] runs full validation; use
//! [`CapabilityManifest::from_json`] to get the structured
//! [`ManifestValidationError`] instead of a flattened serde message.
//!
//! ```
//! use acdif_manifest::prelude::*;
//!
//! let manifest = CapabilityManifest::from_json(r#"{
//!     "module_id": "ingest",
//!     "module_version": "2.1.0",
//!     "name": "load_csv",
//!     "capability_type": "storage",
//!     "version": "1.0.0",
//!     "outputs": {
//!         "table": { "schema_type": "avro", "schema_definition": { "type": "record" } }
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(manifest.capability_type(), CapabilityType::Storage);
//! assert!(manifest.inputs().is_empty());
//! assert_eq!(manifest.content_hash().len(), 64);
//! ```

use std::collections::BTreeMap;

use acdif_schema::document::{SchemaDocument, SchemaFields};
use semver::Version;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capability::CapabilityType;
use crate::validator::ManifestValidator;
use crate::{ManifestError, ManifestValidationError};

// ---------------------------------------------------------------------------
// ManifestFields
// ---------------------------------------------------------------------------

/// Raw, unvalidated manifest record.
///
/// Versions, capability type and schema kinds are plain text here; they are
/// parsed (and rejected if invalid) by the validator. Input and output names
/// are map keys, so they are unique and their insertion order is irrelevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestFields {
    /// Manifest identifier. A v4 UUID is generated when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub module_id: String,
    pub module_version: String,
    pub name: String,
    pub capability_type: String,
    pub version: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, SchemaFields>,
    #[serde(default)]
    pub outputs: BTreeMap<String, SchemaFields>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ManifestFields {
    /// A record with identity and versions set and no contracts.
    pub fn new(
        module_id: impl Into<String>,
        module_version: impl Into<String>,
        name: impl Into<String>,
        capability_type: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            module_id: module_id.into(),
            module_version: module_version.into(),
            name: name.into(),
            capability_type: capability_type.into(),
            version: version.into(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            dependencies: Vec::new(),
            description: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Declare (or replace) a named input.
    pub fn input(mut self, name: impl Into<String>, schema: SchemaFields) -> Self {
        self.inputs.insert(name.into(), schema);
        self
    }

    /// Declare (or replace) a named output.
    pub fn output(mut self, name: impl Into<String>, schema: SchemaFields) -> Self {
        self.outputs.insert(name.into(), schema);
        self
    }

    /// Append a dependency on another capability, by name.
    pub fn depends_on(mut self, capability: impl Into<String>) -> Self {
        self.dependencies.push(capability.into());
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

// ---------------------------------------------------------------------------
// CapabilityManifest
// ---------------------------------------------------------------------------

/// A validated, immutable capability declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ManifestFields")]
pub struct CapabilityManifest {
    id: Uuid,
    module_id: String,
    module_version: Version,
    name: String,
    capability_type: CapabilityType,
    version: Version,
    inputs: BTreeMap<String, SchemaDocument>,
    outputs: BTreeMap<String, SchemaDocument>,
    dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Everything in a manifest except its `id`.
#[derive(Serialize)]
struct ContentView<'a> {
    module_id: &'a str,
    module_version: &'a Version,
    name: &'a str,
    capability_type: CapabilityType,
    version: &'a Version,
    inputs: &'a BTreeMap<String, SchemaDocument>,
    outputs: &'a BTreeMap<String, SchemaDocument>,
    dependencies: &'a [String],
    description: Option<&'a str>,
}

impl CapabilityManifest {
    /// Validate `fields` with the default validator and build the manifest.
    pub fn new(fields: ManifestFields) -> Result<Self, ManifestValidationError> {
        ManifestValidator::new().validate(fields)
    }

    /// Assemble a manifest from already-validated parts.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: Uuid,
        module_id: String,
        module_version: Version,
        name: String,
        capability_type: CapabilityType,
        version: Version,
        inputs: BTreeMap<String, SchemaDocument>,
        outputs: BTreeMap<String, SchemaDocument>,
        dependencies: Vec<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            id,
            module_id,
            module_version,
            name,
            capability_type,
            version,
            inputs,
            outputs,
            dependencies,
            description,
        }
    }

    /// Parse and validate a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let fields: ManifestFields = serde_json::from_str(json)?;
        Ok(Self::new(fields)?)
    }

    /// Serialize to pretty-printed JSON in the producer field layout.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// An editable record carrying this manifest's values, including its `id`.
    pub fn to_fields(&self) -> ManifestFields {
        ManifestFields {
            id: Some(self.id),
            module_id: self.module_id.clone(),
            module_version: self.module_version.to_string(),
            name: self.name.clone(),
            capability_type: self.capability_type.as_str().to_owned(),
            version: self.version.to_string(),
            inputs: to_raw(&self.inputs),
            outputs: to_raw(&self.outputs),
            dependencies: self.dependencies.clone(),
            description: self.description.clone(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    pub fn module_version(&self) -> &Version {
        &self.module_version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability_type(&self) -> CapabilityType {
        self.capability_type
    }

    /// The capability's own version (distinct from the module version).
    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn inputs(&self) -> &BTreeMap<String, SchemaDocument> {
        &self.inputs
    }

    pub fn outputs(&self) -> &BTreeMap<String, SchemaDocument> {
        &self.outputs
    }

    /// Names of capabilities this one depends on, in declaration order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Inputs a caller must supply.
    pub fn required_inputs(&self) -> impl Iterator<Item = (&str, &SchemaDocument)> {
        self.inputs
            .iter()
            .filter(|(_, doc)| doc.required())
            .map(|(name, doc)| (name.as_str(), doc))
    }

    /// Whether `other` declares the same capability of the same module.
    ///
    /// Versions are not compared; two manifests with equal versions still
    /// count as a pair here.
    pub fn is_version_pair_of(&self, other: &CapabilityManifest) -> bool {
        self.module_id == other.module_id && self.name == other.name
    }

    /// `module_id/name`, used in diagnostics.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.module_id, self.name)
    }

    /// BLAKE3 hex digest (64 lowercase hex chars) of the manifest content.
    ///
    /// Covers every field except `id`, so two manifests built from the same
    /// record hash equal even when their ids were generated separately.
    pub fn content_hash(&self) -> String {
        let view = ContentView {
            module_id: &self.module_id,
            module_version: &self.module_version,
            name: &self.name,
            capability_type: self.capability_type,
            version: &self.version,
            inputs: &self.inputs,
            outputs: &self.outputs,
            dependencies: &self.dependencies,
            description: self.description.as_deref(),
        };

        // Map keys serialize in sorted order, so the byte stream is canonical.
        let json_bytes = serde_json::to_vec(&view)
            .expect("manifest content should always be JSON-serializable");

        blake3::hash(&json_bytes).to_hex().to_string()
    }
}

impl TryFrom<ManifestFields> for CapabilityManifest {
    type Error = ManifestValidationError;

    fn try_from(fields: ManifestFields) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

fn to_raw(docs: &BTreeMap<String, SchemaDocument>) -> BTreeMap<String, SchemaFields> {
    docs.iter()
        .map(|(name, doc)| (name.clone(), SchemaFields::from(doc)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
