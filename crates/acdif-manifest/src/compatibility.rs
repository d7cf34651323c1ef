//! Compatibility resolution between two versions of one capability.
//!
//! [`CompatibilityResolver::resolve`] answers "can a consumer built against
//! `older` safely use `newer`?" and classifies the change as
//! [`CompatibilityLevel::Major`] (breaking), [`CompatibilityLevel::Minor`]
//! (additive) or [`CompatibilityLevel::Patch`] (no contract change).
//!
//! # Algorithm
//!
//! 1. Both manifests must share `module_id` and `name`, and `newer` must not
//!    precede `older` by semver precedence. Otherwise the comparison fails
//!    with [`InvalidComparisonError`].
//! 2. A major version bump is a breaking declaration and is trusted as-is.
//! 3. Otherwise the input/output contracts are diffed. Removing a required
//!    input, removing any output or changing a schema kind breaks consumers;
//!    if that happens under a minor/patch bump the verdict is still `Major`
//!    and the verdict is marked [`understated`](Verdict::understated).
//! 4. A minor bump gives `Minor`. Any other contract change under a patch
//!    bump also gives `Minor`, again marked understated.
//! 5. `Patch` is left for pairs with no contract change at all.
//!
//! The verdict carries the version delta and every contract change found, so
//! an automatic classification can be audited via [`Verdict::rationale`].
//!
//! # Strict mode
//!
//! [`ResolverPolicy::strict`] additionally treats narrowing changes as
//! breaking: a new required input, an input that became required and an
//! output that became optional.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use acdif_schema::document::SchemaDocument;
use acdif_schema::kind::SchemaKind;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::manifest::CapabilityManifest;
use crate::version::{cmp_precedence, VersionDelta};
use crate::InvalidComparisonError;

// ---------------------------------------------------------------------------
// CompatibilityLevel
// ---------------------------------------------------------------------------

/// Impact of a version pair on consumers. Ordered `Patch < Minor < Major`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityLevel {
    /// Bug fixes; no contract change.
    Patch,
    /// Backward-compatible additions.
    Minor,
    /// Breaking changes.
    Major,
}

impl CompatibilityLevel {
    pub fn is_breaking(self) -> bool {
        self == CompatibilityLevel::Major
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompatibilityLevel::Patch => "patch",
            CompatibilityLevel::Minor => "minor",
            CompatibilityLevel::Major => "major",
        }
    }
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ResolverPolicy
// ---------------------------------------------------------------------------

/// Tunables for [`CompatibilityResolver`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverPolicy {
    /// Treat narrowing changes (new required inputs, optional -> required
    /// inputs, required -> optional outputs) as breaking. Default: `false`.
    pub strict: bool,
}

// ---------------------------------------------------------------------------
// SchemaChange
// ---------------------------------------------------------------------------

/// Which side of the contract a change affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractSide {
    Input,
    Output,
}

impl fmt::Display for ContractSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContractSide::Input => "input",
            ContractSide::Output => "output",
        })
    }
}

/// What happened to one named input or output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "change")]
pub enum ChangeKind {
    Added { required: bool },
    Removed { required: bool },
    BecameRequired,
    BecameOptional,
    KindChanged { from: SchemaKind, to: SchemaKind },
    BodyChanged,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added { required: true } => f.write_str("added (required)"),
            ChangeKind::Added { required: false } => f.write_str("added (optional)"),
            ChangeKind::Removed { required: true } => f.write_str("removed (was required)"),
            ChangeKind::Removed { required: false } => f.write_str("removed (was optional)"),
            ChangeKind::BecameRequired => f.write_str("changed from optional to required"),
            ChangeKind::BecameOptional => f.write_str("changed from required to optional"),
            ChangeKind::KindChanged { from, to } => {
                write!(f, "schema kind changed from {from} to {to}")
            }
            ChangeKind::BodyChanged => f.write_str("schema body changed"),
        }
    }
}

/// One structural difference between two contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaChange {
    pub side: ContractSide,
    /// Input or output name.
    pub name: String,
    pub kind: ChangeKind,
    /// Whether consumers of the older contract break, under the policy the
    /// change was detected with.
    pub breaking: bool,
}

impl SchemaChange {
    fn new(side: ContractSide, name: &str, kind: ChangeKind, policy: &ResolverPolicy) -> Self {
        let breaking = match (side, &kind) {
            (ContractSide::Input, ChangeKind::Removed { required: true })
            | (ContractSide::Output, ChangeKind::Removed { .. })
            | (_, ChangeKind::KindChanged { .. }) => true,
            (ContractSide::Input, ChangeKind::Added { required: true })
            | (ContractSide::Input, ChangeKind::BecameRequired)
            | (ContractSide::Output, ChangeKind::BecameOptional) => policy.strict,
            _ => false,
        };
        Self {
            side,
            name: name.to_owned(),
            kind,
            breaking,
        }
    }

    /// Whether the change only widens what the capability offers.
    pub fn is_additive(&self) -> bool {
        matches!(
            (self.side, &self.kind),
            (_, ChangeKind::Added { .. })
                | (ContractSide::Input, ChangeKind::BecameOptional)
                | (ContractSide::Output, ChangeKind::BecameRequired)
        ) && !self.breaking
    }
}

impl fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' {}", self.side, self.name, self.kind)?;
        if self.breaking {
            f.write_str(" [breaking]")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// The outcome of resolving a version pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// The effective compatibility level.
    pub level: CompatibilityLevel,
    /// What the version bump declares.
    pub delta: VersionDelta,
    pub older_version: Version,
    pub newer_version: Version,
    /// Every contract difference, inputs first, each side in name order.
    pub changes: Vec<SchemaChange>,
    /// The declared bump is smaller than the detected impact.
    pub understated: bool,
}

impl Verdict {
    /// The level the version bump alone claims.
    pub fn declared_level(&self) -> CompatibilityLevel {
        self.delta.declared_level()
    }

    pub fn breaking_changes(&self) -> impl Iterator<Item = &SchemaChange> {
        self.changes.iter().filter(|c| c.breaking)
    }

    /// Human-readable audit trail, one line per fact.
    ///
    /// The first line is always the version delta, followed by one line per
    /// contract change and, for understated bumps, a line naming the
    /// mismatch.
    pub fn rationale(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.changes.len() + 2);
        lines.push(format!(
            "version {} -> {}: {}",
            self.older_version, self.newer_version, self.delta
        ));
        lines.extend(self.changes.iter().map(SchemaChange::to_string));
        if self.understated {
            let detected = if self.level.is_breaking() {
                "structural break detected"
            } else {
                "contract changes detected"
            };
            lines.push(format!(
                "declared {} bump understates impact: {detected}, classified as {}",
                self.declared_level(),
                self.level
            ));
        }
        lines
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.rationale().join("; "))
    }
}

// ---------------------------------------------------------------------------
// CompatibilityResolver
// ---------------------------------------------------------------------------

/// Stateless resolver for version pairs.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityResolver {
    policy: ResolverPolicy,
}

impl CompatibilityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ResolverPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ResolverPolicy {
        &self.policy
    }

    /// Classify the upgrade from `older` to `newer`.
    ///
    /// Not symmetric: swapping the arguments of a real upgrade fails with
    /// [`InvalidComparisonError::Downgrade`].
    pub fn resolve(
        &self,
        older: &CapabilityManifest,
        newer: &CapabilityManifest,
    ) -> Result<Verdict, InvalidComparisonError> {
        if !older.is_version_pair_of(newer) {
            return Err(InvalidComparisonError::IdentityMismatch {
                older: older.qualified_name(),
                newer: newer.qualified_name(),
            });
        }
        if cmp_precedence(newer.version(), older.version()) == Ordering::Less {
            return Err(InvalidComparisonError::Downgrade {
                older: older.version().clone(),
                newer: newer.version().clone(),
            });
        }

        let delta = VersionDelta::between(older.version(), newer.version());
        let mut changes = Vec::new();
        diff_side(
            ContractSide::Input,
            older.inputs(),
            newer.inputs(),
            &self.policy,
            &mut changes,
        );
        diff_side(
            ContractSide::Output,
            older.outputs(),
            newer.outputs(),
            &self.policy,
            &mut changes,
        );

        let breaking = changes.iter().any(|c| c.breaking);

        let (level, understated) = match delta {
            VersionDelta::Major => (CompatibilityLevel::Major, false),
            _ if breaking => (CompatibilityLevel::Major, true),
            VersionDelta::Minor => (CompatibilityLevel::Minor, false),
            _ if !changes.is_empty() => (CompatibilityLevel::Minor, true),
            _ => (CompatibilityLevel::Patch, false),
        };

        let verdict = Verdict {
            level,
            delta,
            older_version: older.version().clone(),
            newer_version: newer.version().clone(),
            changes,
            understated,
        };

        if understated {
            tracing::warn!(
                capability = %newer.qualified_name(),
                older = %verdict.older_version,
                newer = %verdict.newer_version,
                declared = %verdict.declared_level(),
                detected = %level,
                "declared version bump understates contract changes"
            );
        }
        tracing::trace!(
            capability = %newer.qualified_name(),
            level = %level,
            changes = verdict.changes.len(),
            "resolved compatibility"
        );

        Ok(verdict)
    }
}

/// Resolve with the default (non-strict) policy.
pub fn resolve(
    older: &CapabilityManifest,
    newer: &CapabilityManifest,
) -> Result<Verdict, InvalidComparisonError> {
    CompatibilityResolver::new().resolve(older, newer)
}

fn diff_side(
    side: ContractSide,
    older: &BTreeMap<String, SchemaDocument>,
    newer: &BTreeMap<String, SchemaDocument>,
    policy: &ResolverPolicy,
    out: &mut Vec<SchemaChange>,
) {
    let names: BTreeSet<&String> = older.keys().chain(newer.keys()).collect();
    for name in names {
        match (older.get(name), newer.get(name)) {
            (Some(before), None) => out.push(SchemaChange::new(
                side,
                name,
                ChangeKind::Removed {
                    required: before.required(),
                },
                policy,
            )),
            (None, Some(after)) => out.push(SchemaChange::new(
                side,
                name,
                ChangeKind::Added {
                    required: after.required(),
                },
                policy,
            )),
            (Some(before), Some(after)) => {
                if before.kind() != after.kind() {
                    out.push(SchemaChange::new(
                        side,
                        name,
                        ChangeKind::KindChanged {
                            from: before.kind(),
                            to: after.kind(),
                        },
                        policy,
                    ));
                } else if before.body() != after.body() {
                    out.push(SchemaChange::new(side, name, ChangeKind::BodyChanged, policy));
                }
                match (before.required(), after.required()) {
                    (false, true) => out.push(SchemaChange::new(
                        side,
                        name,
                        ChangeKind::BecameRequired,
                        policy,
                    )),
                    (true, false) => out.push(SchemaChange::new(
                        side,
                        name,
                        ChangeKind::BecameOptional,
                        policy,
                    )),
                    _ => {}
                }
            }
            (None, None) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestFields;
    use acdif_schema::document::SchemaFields;
    use serde_json::json;

    fn json_schema(ty: &str) -> SchemaFields {
        SchemaFields::new("json_schema", json!({ "type": ty }))
    }

    fn base(version: &str) -> ManifestFields {
        ManifestFields::new("search", "1.0.0", "rank", "api_integration", version)
            .input("query", json_schema("string"))
            .input("limit", json_schema("integer").optional())
            .output("hits", json_schema("array"))
    }

    fn build(fields: ManifestFields) -> CapabilityManifest {
        CapabilityManifest::new(fields).unwrap()
    }

    #[test]
    fn identical_manifests_are_patch_with_no_changes() {
        let verdict = resolve(&build(base("1.0.0")), &build(base("1.0.0"))).unwrap();
        assert_eq!(verdict.level, CompatibilityLevel::Patch);
        assert_eq!(verdict.delta, VersionDelta::Identical);
        assert!(verdict.changes.is_empty());
        assert_eq!(verdict.rationale(), ["version 1.0.0 -> 1.0.0: versions identical"]);
    }

    #[test]
    fn removing_optional_input_is_not_breaking() {
        let mut newer = base("1.0.1");
        newer.inputs.remove("limit");
        let verdict = resolve(&build(base("1.0.0")), &build(newer)).unwrap();
        assert_eq!(verdict.level, CompatibilityLevel::Minor);
        assert!(verdict.understated);
        assert_eq!(
            verdict.changes,
            [SchemaChange {
                side: ContractSide::Input,
                name: "limit".to_owned(),
                kind: ChangeKind::Removed { required: false },
                breaking: false,
            }]
        );
    }

    #[test]
    fn removing_output_under_minor_is_major_and_understated() {
        let mut newer = base("1.1.0");
        newer.outputs.clear();
        let verdict = resolve(&build(base("1.0.0")), &build(newer)).unwrap();
        assert_eq!(verdict.level, CompatibilityLevel::Major);
        assert!(verdict.understated);
        assert_eq!(verdict.declared_level(), CompatibilityLevel::Minor);
        assert_eq!(verdict.breaking_changes().count(), 1);
        assert_eq!(
            verdict.rationale().last().unwrap(),
            "declared minor bump understates impact: structural break detected, classified as major"
        );
    }

    #[test]
    fn additive_change_under_patch_is_promoted_to_minor() {
        let newer = base("1.0.1").output("facets", json_schema("object"));
        let verdict = resolve(&build(base("1.0.0")), &build(newer)).unwrap();
        assert_eq!(verdict.level, CompatibilityLevel::Minor);
        assert!(verdict.understated);
        assert!(verdict.rationale().iter().any(|l| l == "output 'facets' added (required)"));
    }

    #[test]
    fn body_change_under_patch_is_promoted_to_minor() {
        let newer = base("1.0.1").input("query", json_schema("object"));
        let verdict = resolve(&build(base("1.0.0")), &build(newer)).unwrap();
        assert_eq!(verdict.level, CompatibilityLevel::Minor);
        assert!(verdict.understated);
        assert_eq!(verdict.changes[0].kind, ChangeKind::BodyChanged);
        assert!(!verdict.changes[0].breaking);
        assert_eq!(
            verdict.rationale().last().unwrap(),
            "declared patch bump understates impact: contract changes detected, classified as minor"
        );
    }

    #[test]
    fn output_made_optional_under_patch_is_not_patch() {
        let newer = base("1.0.1").output("hits", json_schema("array").optional());
        let verdict = resolve(&build(base("1.0.0")), &build(newer)).unwrap();
        assert_eq!(verdict.changes[0].kind, ChangeKind::BecameOptional);
        assert_eq!(verdict.level, CompatibilityLevel::Minor);
        assert!(verdict.understated);

        let strict = CompatibilityResolver::with_policy(ResolverPolicy { strict: true });
        let newer = base("1.0.1").output("hits", json_schema("array").optional());
        let verdict = strict.resolve(&build(base("1.0.0")), &build(newer)).unwrap();
        assert_eq!(verdict.level, CompatibilityLevel::Major);
    }

    #[test]
    fn lenient_policy_allows_new_required_input_under_minor() {
        let newer = base("1.1.0").input("locale", json_schema("string"));
        let verdict = resolve(&build(base("1.0.0")), &build(newer)).unwrap();
        assert_eq!(verdict.level, CompatibilityLevel::Minor);
        assert!(!verdict.understated);
    }

    #[test]
    fn strict_policy_flags_narrowing_changes() {
        let strict = CompatibilityResolver::with_policy(ResolverPolicy { strict: true });
        let older = build(base("1.0.0"));

        let new_required = build(base("1.1.0").input("locale", json_schema("string")));
        let verdict = strict.resolve(&older, &new_required).unwrap();
        assert_eq!(verdict.level, CompatibilityLevel::Major);
        assert!(verdict.understated);

        let became_required = build(base("1.1.0").input("limit", json_schema("integer")));
        let verdict = strict.resolve(&older, &became_required).unwrap();
        assert_eq!(verdict.changes[0].kind, ChangeKind::BecameRequired);
        assert!(verdict.changes[0].breaking);

        let became_optional = build(base("1.0.1").output("hits", json_schema("array").optional()));
        let verdict = strict.resolve(&older, &became_optional).unwrap();
        assert_eq!(verdict.changes[0].kind, ChangeKind::BecameOptional);
        assert!(verdict.changes[0].breaking);
        assert_eq!(verdict.level, CompatibilityLevel::Major);
        assert!(verdict.understated);
    }

    #[test]
    fn pre_release_to_release_is_patch() {
        let verdict = resolve(&build(base("2.0.0-rc.1")), &build(base("2.0.0"))).unwrap();
        assert_eq!(verdict.delta, VersionDelta::PreRelease);
        assert_eq!(verdict.level, CompatibilityLevel::Patch);
    }

    #[test]
    fn identity_mismatch_is_rejected() {
        let mut other = base("1.1.0");
        other.name = "rerank".to_owned();
        let err = resolve(&build(base("1.0.0")), &build(other)).unwrap_err();
        assert_eq!(
            err,
            InvalidComparisonError::IdentityMismatch {
                older: "search/rank".to_owned(),
                newer: "search/rerank".to_owned(),
            }
        );
    }

    #[test]
    fn changes_are_ordered_inputs_then_outputs_by_name() {
        let mut newer = base("2.0.0")
            .input("a_first", json_schema("string").optional())
            .output("z_last", json_schema("string"));
        newer.inputs.remove("query");
        let verdict = resolve(&build(base("1.0.0")), &build(newer)).unwrap();
        let names: Vec<(ContractSide, &str)> = verdict
            .changes
            .iter()
            .map(|c| (c.side, c.name.as_str()))
            .collect();
        assert_eq!(
            names,
            [
                (ContractSide::Input, "a_first"),
                (ContractSide::Input, "query"),
                (ContractSide::Output, "z_last"),
            ]
        );
        assert!(!verdict.understated);
    }

    #[test]
    fn level_ordering_and_display() {
        assert!(CompatibilityLevel::Patch < CompatibilityLevel::Minor);
        assert!(CompatibilityLevel::Minor < CompatibilityLevel::Major);
        assert!(CompatibilityLevel::Major.is_breaking());
        assert_eq!(CompatibilityLevel::Minor.to_string(), "minor");
        assert_eq!(
            serde_json::to_string(&CompatibilityLevel::Major).unwrap(),
            "\"major\""
        );
    }
}
