//! Per-kind well-formedness rules.
//!
//! [`check`] dispatches on the [`SchemaKind`] and either returns the
//! (possibly normalized) body or the first defect found in it. The rules are
//! deliberately asymmetric:
//!
//! | Kind          | Rule                                                    |
//! |---------------|---------------------------------------------------------|
//! | `json_schema` | mapping; missing `$schema` is filled with the draft URI |
//! | `openapi`     | mapping; `openapi` version field is mandatory           |
//! | `protobuf`    | non-empty mapping                                       |
//! | `avro`        | non-empty mapping                                       |
//!
//! Deep grammar checks for protobuf and avro belong to whoever owns those
//! formats; this module only makes sure a body was supplied.

use serde_json::{Map, Value};

use crate::kind::SchemaKind;
use crate::policy::SchemaPolicy;
use crate::SchemaValidationError;

/// Key holding a JSON schema's draft identifier.
pub const SCHEMA_IDENTIFIER_KEY: &str = "$schema";

/// Key holding an OpenAPI document's version.
pub const OPENAPI_VERSION_KEY: &str = "openapi";

/// Validate `body` against the rules for `kind`.
///
/// Returns the body as a mapping. For JSON schemas without a `$schema` key,
/// the returned mapping carries the policy's draft identifier.
pub fn check(
    kind: SchemaKind,
    body: Value,
    policy: &SchemaPolicy,
) -> Result<Map<String, Value>, SchemaValidationError> {
    let mut body = match body {
        Value::Object(map) => map,
        other => {
            return Err(SchemaValidationError::NotAMapping {
                kind,
                found: json_type_name(&other),
            })
        }
    };

    match kind {
        SchemaKind::JsonSchema => check_json_schema(&mut body, policy)?,
        SchemaKind::OpenApi => check_openapi(&body)?,
        SchemaKind::Protobuf | SchemaKind::Avro => check_opaque(kind, &body, policy)?,
    }

    Ok(body)
}

fn check_json_schema(
    body: &mut Map<String, Value>,
    policy: &SchemaPolicy,
) -> Result<(), SchemaValidationError> {
    match body.get(SCHEMA_IDENTIFIER_KEY) {
        Some(Value::String(_)) => Ok(()),
        Some(other) => Err(SchemaValidationError::InvalidSchemaIdentifier {
            found: other.to_string(),
        }),
        None => {
            tracing::debug!(
                draft = %policy.json_schema_draft,
                "json schema body has no $schema, injecting default draft"
            );
            body.insert(
                SCHEMA_IDENTIFIER_KEY.to_owned(),
                Value::String(policy.json_schema_draft.clone()),
            );
            Ok(())
        }
    }
}

fn check_openapi(body: &Map<String, Value>) -> Result<(), SchemaValidationError> {
    match body.get(OPENAPI_VERSION_KEY) {
        None => Err(SchemaValidationError::MissingOpenApiVersion),
        Some(Value::String(version)) if !version.trim().is_empty() => Ok(()),
        Some(other) => Err(SchemaValidationError::InvalidOpenApiVersion {
            found: other.to_string(),
        }),
    }
}

fn check_opaque(
    kind: SchemaKind,
    body: &Map<String, Value>,
    policy: &SchemaPolicy,
) -> Result<(), SchemaValidationError> {
    if body.is_empty() && !policy.allow_empty_opaque_bodies {
        return Err(SchemaValidationError::EmptyBody { kind });
    }
    Ok(())
}

/// Short name of a JSON value's type, used in error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
