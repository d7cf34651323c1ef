//! Schema kind taxonomy.
//!
//! A [`SchemaKind`] names the format family an input/output contract is
//! written in. The set is closed: adding a kind forces every `match` over
//! it (most importantly [`rules::check`](crate::rules::check)) to be
//! revisited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SchemaValidationError;

/// The format family of a schema body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SchemaKind {
    /// Structural JSON Schema.
    #[serde(rename = "json_schema")]
    JsonSchema,
    /// Protocol buffer message schema.
    #[serde(rename = "protobuf")]
    Protobuf,
    /// Avro row schema.
    #[serde(rename = "avro")]
    Avro,
    /// OpenAPI document.
    #[serde(rename = "openapi")]
    OpenApi,
}

impl SchemaKind {
    /// Every supported kind, in declaration order.
    pub const ALL: [SchemaKind; 4] = [
        SchemaKind::JsonSchema,
        SchemaKind::Protobuf,
        SchemaKind::Avro,
        SchemaKind::OpenApi,
    ];

    /// The wire tag for this kind (`"json_schema"`, `"protobuf"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::JsonSchema => "json_schema",
            SchemaKind::Protobuf => "protobuf",
            SchemaKind::Avro => "avro",
            SchemaKind::OpenApi => "openapi",
        }
    }

    /// Whether the body's deeper grammar is owned by an external collaborator.
    ///
    /// Opaque kinds are only checked for "a non-empty mapping was supplied".
    pub fn is_opaque(self) -> bool {
        matches!(self, SchemaKind::Protobuf | SchemaKind::Avro)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaKind {
    type Err = SchemaValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchemaKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SchemaValidationError::UnknownKind {
                value: s.to_owned(),
                supported: SchemaKind::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
