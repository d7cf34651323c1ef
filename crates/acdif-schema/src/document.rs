//! Immutable input/output contract documents.
//!
//! A [`SchemaDocument`] is built either directly from typed parts
//! ([`SchemaDocument::new`]) or from a raw [`SchemaFields`] record as it
//! arrives from build tooling ([`SchemaDocument::from_fields`]). Both paths
//! run [`rules::check`](crate::rules::check), so every document in existence
//! is well-formed for its kind.
//!
//! # Wire format
//!
//! Documents serialize with the field names used by manifest producers:
//!
//! ```json
//! {
//!   "schema_type": "json_schema",
//!   "schema_definition": { "$schema": "...", "type": "object" },
//!   "required": true,
//!   "description": "Rows to score"
//! }
//! ```
//!
//! Deserializing goes through [`SchemaFields`] and the default
//! [`SchemaPolicy`], so a malformed document cannot be deserialized.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kind::SchemaKind;
use crate::policy::SchemaPolicy;
use crate::rules;
use crate::SchemaValidationError;

// ---------------------------------------------------------------------------
// SchemaFields
// ---------------------------------------------------------------------------

/// Raw, unvalidated schema record.
///
/// The kind is kept as text and the body as an arbitrary JSON value so that
/// an unknown kind or a non-mapping body can be reported instead of failing
/// at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaFields {
    /// Schema kind tag, e.g. `"json_schema"`.
    #[serde(rename = "schema_type", alias = "kind")]
    pub kind: String,
    /// Schema body in the kind's format.
    #[serde(rename = "schema_definition", alias = "body")]
    pub body: Value,
    /// Whether the input/output is required. Defaults to `true`.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_required() -> bool {
    true
}

impl SchemaFields {
    /// A required schema record with no description.
    pub fn new(kind: impl Into<String>, body: Value) -> Self {
        Self {
            kind: kind.into(),
            body,
            required: true,
            description: None,
        }
    }

    /// Mark the record as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attach a description.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

impl From<&SchemaDocument> for SchemaFields {
    fn from(doc: &SchemaDocument) -> Self {
        Self {
            kind: doc.kind.as_str().to_owned(),
            body: Value::Object(doc.body.clone()),
            required: doc.required,
            description: doc.description.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// SchemaDocument
// ---------------------------------------------------------------------------

/// A validated, immutable input or output contract.
///
/// Fields are private and there are no mutators. Building a modified
/// contract means building a new document, e.g. from
/// `SchemaFields::from(&doc)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaFields")]
pub struct SchemaDocument {
    #[serde(rename = "schema_type")]
    kind: SchemaKind,
    #[serde(rename = "schema_definition")]
    body: Map<String, Value>,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl SchemaDocument {
    /// Build a document under the default [`SchemaPolicy`].
    pub fn new(
        kind: SchemaKind,
        body: Map<String, Value>,
        required: bool,
        description: Option<String>,
    ) -> Result<Self, SchemaValidationError> {
        Self::with_policy(kind, body, required, description, &SchemaPolicy::default())
    }

    /// Build a document under an explicit policy.
    pub fn with_policy(
        kind: SchemaKind,
        body: Map<String, Value>,
        required: bool,
        description: Option<String>,
        policy: &SchemaPolicy,
    ) -> Result<Self, SchemaValidationError> {
        let body = rules::check(kind, Value::Object(body), policy)?;
        Ok(Self {
            kind,
            body,
            required,
            description,
        })
    }

    /// Build a document from a raw record.
    ///
    /// Fails with [`SchemaValidationError::UnknownKind`] when the kind tag is
    /// not recognised, otherwise with whatever defect the kind's rule finds.
    pub fn from_fields(
        fields: SchemaFields,
        policy: &SchemaPolicy,
    ) -> Result<Self, SchemaValidationError> {
        let kind: SchemaKind = fields.kind.parse()?;
        let body = rules::check(kind, fields.body, policy)?;
        Ok(Self {
            kind,
            body,
            required: fields.required,
            description: fields.description,
        })
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// The normalized schema body.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The `$schema` identifier of a JSON schema body.
    ///
    /// Always `Some` for [`SchemaKind::JsonSchema`] documents; `None` for
    /// other kinds.
    pub fn schema_identifier(&self) -> Option<&str> {
        match self.kind {
            SchemaKind::JsonSchema => self
                .body
                .get(rules::SCHEMA_IDENTIFIER_KEY)
                .and_then(Value::as_str),
            _ => None,
        }
    }
}

impl TryFrom<SchemaFields> for SchemaDocument {
    type Error = SchemaValidationError;

    fn try_from(fields: SchemaFields) -> Result<Self, Self::Error> {
        Self::from_fields(fields, &SchemaPolicy::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
