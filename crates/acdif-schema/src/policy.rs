//! Validation policy for schema documents.

use serde::{Deserialize, Serialize};

/// The JSON Schema draft injected into bodies that omit `$schema`.
pub const DEFAULT_JSON_SCHEMA_DRAFT: &str = "http://json-schema.org/draft-07/schema#";

/// Tunables for [`rules::check`](crate::rules::check).
///
/// The defaults reproduce the standard rules: draft-07 is injected into JSON
/// schemas and empty protobuf/avro bodies are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaPolicy {
    /// Identifier written to `$schema` when a JSON schema body has none.
    pub json_schema_draft: String,
    /// Accept `{}` as a protobuf/avro body. Default: `false`.
    pub allow_empty_opaque_bodies: bool,
}

impl Default for SchemaPolicy {
    fn default() -> Self {
        Self {
            json_schema_draft: DEFAULT_JSON_SCHEMA_DRAFT.to_owned(),
            allow_empty_opaque_bodies: false,
        }
    }
}
