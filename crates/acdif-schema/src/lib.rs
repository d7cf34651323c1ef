//! ACDIF Schema -- typed input/output contracts for capability manifests.
//!
//! Every input and output a capability declares is described by a
//! [`SchemaDocument`](document::SchemaDocument): a [`SchemaKind`](kind::SchemaKind)
//! tag plus a body in that kind's format. Documents are checked for
//! well-formedness when they are built and are immutable afterwards.
//!
//! # Quick Start
//!
//! ```
//! use acdif_schema::prelude::*;
//! use serde_json::json;
//!
//! let body = json!({ "type": "object" }).as_object().cloned().unwrap();
//! let doc = SchemaDocument::new(SchemaKind::JsonSchema, body, true, None).unwrap();
//!
//! // The missing `$schema` identifier was filled in.
//! assert!(doc.body().contains_key("$schema"));
//!
//! let err = SchemaDocument::new(SchemaKind::OpenApi, Default::default(), true, None)
//!     .unwrap_err();
//! assert!(matches!(err, SchemaValidationError::MissingOpenApiVersion));
//! ```

#![deny(unsafe_code)]

pub mod document;
pub mod kind;
pub mod policy;
pub mod rules;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A schema body that is not well-formed for its declared kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaValidationError {
    /// The body is a list, scalar or null instead of a string-keyed mapping.
    #[error("{kind} schema body must be a mapping, found {found}")]
    NotAMapping {
        kind: kind::SchemaKind,
        found: &'static str,
    },

    /// An opaque-format body (protobuf, avro) was supplied empty.
    #[error("{kind} schema body must not be empty")]
    EmptyBody { kind: kind::SchemaKind },

    /// An OpenAPI document without the `openapi` version field.
    #[error("OpenAPI schema must specify version (missing 'openapi' field)")]
    MissingOpenApiVersion,

    /// The `openapi` field is present but is not a non-empty string.
    #[error("OpenAPI 'openapi' field must be a non-empty version string, found {found}")]
    InvalidOpenApiVersion { found: String },

    /// A JSON schema whose `$schema` identifier is not a string.
    #[error("JSON schema '$schema' identifier must be a string, found {found}")]
    InvalidSchemaIdentifier { found: String },

    /// A schema kind tag outside the supported set.
    #[error("unknown schema kind '{value}'. Supported kinds: [{supported}]")]
    UnknownKind { value: String, supported: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::document::{SchemaDocument, SchemaFields};
    pub use crate::kind::SchemaKind;
    pub use crate::policy::SchemaPolicy;
    pub use crate::SchemaValidationError;
}
