//! ACDIF Manifest -- typed, versioned capability manifests.
//!
//! A [`CapabilityManifest`](manifest::CapabilityManifest) is the atomic unit
//! of integration: it declares one capability a module exposes, the
//! capability's semantic version, its input/output contracts and the names of
//! the capabilities it depends on. Registries, resolvers and loaders consume
//! manifests as opaque validated values.
//!
//! # Modules
//!
//! - [`capability`]: the closed [`CapabilityType`](capability::CapabilityType)
//!   taxonomy.
//! - [`version`]: semantic version parsing and version deltas.
//! - [`manifest`]: the raw [`ManifestFields`](manifest::ManifestFields) record
//!   and the immutable manifest built from it.
//! - [`validator`]: all-at-once validation of a raw record.
//! - [`compatibility`]: breaking/additive/patch classification of a version
//!   pair.
//!
//! # Example
//!
//! ```
//! use acdif_manifest::prelude::*;
//! use serde_json::json;
//!
//! let v1 = CapabilityManifest::new(
//!     ManifestFields::new("scoring", "0.4.0", "score_rows", "data_processing", "1.2.0")
//!         .input("rows", SchemaFields::new("json_schema", json!({ "type": "array" })))
//!         .output("scores", SchemaFields::new("json_schema", json!({ "type": "array" }))),
//! )
//! .unwrap();
//!
//! let v2 = CapabilityManifest::new(
//!     ManifestFields::new("scoring", "0.5.0", "score_rows", "data_processing", "1.3.0")
//!         .input("rows", SchemaFields::new("json_schema", json!({ "type": "array" })))
//!         .input(
//!             "threshold",
//!             SchemaFields::new("json_schema", json!({ "type": "number" })).optional(),
//!         )
//!         .output("scores", SchemaFields::new("json_schema", json!({ "type": "array" }))),
//! )
//! .unwrap();
//!
//! let verdict = resolve(&v1, &v2).unwrap();
//! assert_eq!(verdict.level, CompatibilityLevel::Minor);
//! ```

#![deny(unsafe_code)]

pub mod capability;
pub mod compatibility;
pub mod manifest;
pub mod validator;
pub mod version;

use std::fmt;

use acdif_schema::SchemaValidationError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A version field that does not parse as a semantic version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} '{text}' is not a valid semantic version: {reason}")]
pub struct InvalidVersionError {
    /// Which manifest field held the text.
    pub field: version::VersionField,
    /// The offending text, verbatim.
    pub text: String,
    /// Parser diagnostic.
    pub reason: String,
}

/// What went wrong at one field path of a manifest record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViolationKind {
    /// A field that must carry text is empty or whitespace.
    #[error("must not be empty")]
    EmptyField,

    /// `version` or `module_version` does not parse.
    #[error(transparent)]
    InvalidVersion(#[from] InvalidVersionError),

    /// `capability_type` is outside the taxonomy.
    #[error(transparent)]
    UnknownCapabilityType(#[from] capability::UnknownCapabilityType),

    /// An input/output schema is malformed or of an unknown kind.
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
}

/// A single problem found while validating a manifest record.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Dotted path of the offending field, e.g. `inputs.rows`.
    pub path: String,
    pub kind: ViolationKind,
    /// Rendered description of `kind`.
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, kind: impl Into<ViolationKind>) -> Self {
        let kind = kind.into();
        Self {
            path: path.into(),
            message: kind.to_string(),
            kind,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found while validating one manifest record.
///
/// Never empty. Validation does not stop at the first problem, so this lists
/// everything the producer has to fix.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "manifest validation failed with {} violation(s): {}",
    .violations.len(),
    render(.violations)
)]
pub struct ManifestValidationError {
    violations: Vec<Violation>,
}

fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ManifestValidationError {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        debug_assert!(!violations.is_empty());
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// The violation recorded at `path`, if any.
    pub fn at(&self, path: &str) -> Option<&Violation> {
        self.violations.iter().find(|v| v.path == path)
    }
}

/// Two manifests that cannot be compared as a version pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidComparisonError {
    /// The manifests describe different capabilities.
    #[error("not a version pair: '{older}' vs '{newer}' (module_id and name must match)")]
    IdentityMismatch { older: String, newer: String },

    /// The "newer" manifest has a lower version than the "older" one.
    #[error("newer version {newer} precedes older version {older}")]
    Downgrade {
        older: semver::Version,
        newer: semver::Version,
    },
}

/// Errors from the JSON helpers on [`manifest::CapabilityManifest`].
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The text is not JSON of the manifest record shape.
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The record parsed but failed validation.
    #[error(transparent)]
    Invalid(#[from] ManifestValidationError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::capability::CapabilityType;
    pub use crate::compatibility::{
        resolve, ChangeKind, CompatibilityLevel, CompatibilityResolver, ContractSide,
        ResolverPolicy, SchemaChange, Verdict,
    };
    pub use crate::manifest::{CapabilityManifest, ManifestFields};
    pub use crate::validator::ManifestValidator;
    pub use crate::version::{VersionDelta, VersionField};
    pub use crate::{
        InvalidComparisonError, InvalidVersionError, ManifestError, ManifestValidationError,
        Violation, ViolationKind,
    };
    pub use acdif_schema::prelude::*;
}
