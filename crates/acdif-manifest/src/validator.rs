//! All-at-once manifest validation.
//!
//! [`ManifestValidator::validate`] turns a raw [`ManifestFields`] record into
//! a [`CapabilityManifest`] or a [`ManifestValidationError`] listing every
//! problem found. Nothing short-circuits: a producer fixing a manifest sees
//! all of its defects in one pass.
//!
//! # Checks
//!
//! | Path                          | Rule                                   |
//! |-------------------------------|----------------------------------------|
//! | `module_id`, `name`           | non-empty                              |
//! | `module_version`, `version`   | semantic version                       |
//! | `capability_type`             | one of [`CapabilityType::ALL`]         |
//! | `inputs.<n>` / `outputs.<n>`  | body well-formed for its schema kind   |
//! | `….<n>.schema_type`           | known schema kind                      |
//! | `dependencies[<i>]`           | non-empty capability name              |
//!
//! Input/output name uniqueness is guaranteed by the map type and is not
//! checked at runtime.

use std::collections::BTreeMap;

use acdif_schema::document::{SchemaDocument, SchemaFields};
use acdif_schema::policy::SchemaPolicy;
use acdif_schema::SchemaValidationError;
use uuid::Uuid;

use crate::capability::CapabilityType;
use crate::manifest::{CapabilityManifest, ManifestFields};
use crate::version::{parse_version, VersionField};
use crate::{ManifestValidationError, Violation, ViolationKind};

/// Builds manifests from raw records, collecting every violation.
#[derive(Debug, Clone, Default)]
pub struct ManifestValidator {
    policy: SchemaPolicy,
}

impl ManifestValidator {
    /// A validator using the default [`SchemaPolicy`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A validator using a custom schema policy.
    pub fn with_policy(policy: SchemaPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SchemaPolicy {
        &self.policy
    }

    /// Validate `fields` and build the manifest.
    ///
    /// Construction is all-or-nothing: on error no manifest exists.
    pub fn validate(
        &self,
        fields: ManifestFields,
    ) -> Result<CapabilityManifest, ManifestValidationError> {
        let ManifestFields {
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
        } = fields;

        let mut violations = Vec::new();

        if module_id.trim().is_empty() {
            violations.push(Violation::new("module_id", ViolationKind::EmptyField));
        }
        if name.trim().is_empty() {
            violations.push(Violation::new("name", ViolationKind::EmptyField));
        }

        let module_version = collect(
            &mut violations,
            "module_version",
            parse_version(VersionField::ModuleVersion, &module_version),
        );
        let version = collect(
            &mut violations,
            "version",
            parse_version(VersionField::Version, &version),
        );
        let capability_type = collect(
            &mut violations,
            "capability_type",
            capability_type.parse::<CapabilityType>(),
        );

        let inputs = self.validate_schemas("inputs", inputs, &mut violations);
        let outputs = self.validate_schemas("outputs", outputs, &mut violations);

        for (index, dependency) in dependencies.iter().enumerate() {
            if dependency.trim().is_empty() {
                violations.push(Violation::new(
                    format!("dependencies[{index}]"),
                    ViolationKind::EmptyField,
                ));
            }
        }

        match (module_version, version, capability_type) {
            (Some(module_version), Some(version), Some(capability_type))
                if violations.is_empty() =>
            {
                let manifest = CapabilityManifest::from_parts(
                    id.unwrap_or_else(Uuid::new_v4),
                    module_id,
                    module_version,
                    name,
                    capability_type,
                    version,
                    inputs,
                    outputs,
                    dependencies,
                    description,
                );
                tracing::debug!(
                    capability = %manifest.qualified_name(),
                    version = %manifest.version(),
                    inputs = manifest.inputs().len(),
                    outputs = manifest.outputs().len(),
                    "manifest validated"
                );
                Ok(manifest)
            }
            _ => {
                tracing::warn!(
                    module_id = %module_id,
                    name = %name,
                    violations = violations.len(),
                    "manifest rejected"
                );
                Err(ManifestValidationError::new(violations))
            }
        }
    }

    /// Validate one side of the contract. Only well-formed documents are
    /// returned; every defect is pushed onto `violations`.
    fn validate_schemas(
        &self,
        side: &str,
        raw: BTreeMap<String, SchemaFields>,
        violations: &mut Vec<Violation>,
    ) -> BTreeMap<String, SchemaDocument> {
        let mut documents = BTreeMap::new();
        for (name, fields) in raw {
            match SchemaDocument::from_fields(fields, &self.policy) {
                Ok(doc) => {
                    documents.insert(name, doc);
                }
                Err(err @ SchemaValidationError::UnknownKind { .. }) => {
                    violations.push(Violation::new(format!("{side}.{name}.schema_type"), err));
                }
                Err(err) => {
                    violations.push(Violation::new(format!("{side}.{name}"), err));
                }
            }
        }
        documents
    }
}

/// Keep the value, or record the error at `path` and keep nothing.
fn collect<T, E: Into<ViolationKind>>(
    violations: &mut Vec<Violation>,
    path: &str,
    result: Result<T, E>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            violations.push(Violation::new(path, err));
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
