//! Semantic versions of manifests.
//!
//! Parsing and ordering come from the `semver` crate. This module adds the
//! field-aware error ([`InvalidVersionError`]) and the [`VersionDelta`]
//! between two versions, which is what a version bump *declares* about
//! compatibility.

use std::cmp::Ordering;
use std::fmt;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::compatibility::CompatibilityLevel;
use crate::InvalidVersionError;

/// The manifest fields that hold semantic versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionField {
    /// The capability's own version.
    Version,
    /// The owning module's version.
    ModuleVersion,
}

impl VersionField {
    pub fn as_str(self) -> &'static str {
        match self {
            VersionField::Version => "version",
            VersionField::ModuleVersion => "module_version",
        }
    }
}

impl fmt::Display for VersionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse `text` as `major.minor.patch[-pre][+build]`.
///
/// No leading `v`, no surrounding whitespace, no missing components.
pub fn parse_version(field: VersionField, text: &str) -> Result<Version, InvalidVersionError> {
    Version::parse(text).map_err(|err| InvalidVersionError {
        field,
        text: text.to_owned(),
        reason: err.to_string(),
    })
}

/// Order two versions by semver precedence.
///
/// Build metadata is ignored, so `1.0.0+a` and `1.0.0+b` compare equal.
pub fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

// ---------------------------------------------------------------------------
// VersionDelta
// ---------------------------------------------------------------------------

/// The most significant component that differs between two versions.
///
/// Ordered from least to most significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionDelta {
    Identical,
    BuildMetadata,
    PreRelease,
    Patch,
    Minor,
    Major,
}

impl VersionDelta {
    /// Classify the change from `older` to `newer`.
    pub fn between(older: &Version, newer: &Version) -> Self {
        if older.major != newer.major {
            VersionDelta::Major
        } else if older.minor != newer.minor {
            VersionDelta::Minor
        } else if older.patch != newer.patch {
            VersionDelta::Patch
        } else if older.pre != newer.pre {
            VersionDelta::PreRelease
        } else if older.build != newer.build {
            VersionDelta::BuildMetadata
        } else {
            VersionDelta::Identical
        }
    }

    /// The compatibility level the bump claims.
    pub fn declared_level(self) -> CompatibilityLevel {
        match self {
            VersionDelta::Major => CompatibilityLevel::Major,
            VersionDelta::Minor => CompatibilityLevel::Minor,
            VersionDelta::Patch
            | VersionDelta::PreRelease
            | VersionDelta::BuildMetadata
            | VersionDelta::Identical => CompatibilityLevel::Patch,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            VersionDelta::Major => "major version changed (breaking by declaration)",
            VersionDelta::Minor => "minor version changed",
            VersionDelta::Patch => "patch version changed",
            VersionDelta::PreRelease => "pre-release changed",
            VersionDelta::BuildMetadata => "build metadata changed",
            VersionDelta::Identical => "versions identical",
        }
    }
}

impl fmt::Display for VersionDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
