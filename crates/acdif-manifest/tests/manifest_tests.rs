//! Construction and validation behaviour of capability manifests.
//!
//! Covers eager schema validation at construction, the JSON-schema default
//! identifier, the closed capability taxonomy and all-or-nothing
//! construction.

use acdif_manifest::prelude::*;
use serde_json::json;
use uuid::Uuid;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn training_fields() -> ManifestFields {
    ManifestFields::new("trainer", "4.2.0", "fit_model", "model_training", "2.1.0")
        .input(
            "dataset",
            SchemaFields::new(
                "avro",
                json!({ "type": "record", "name": "Sample", "fields": [] }),
            ),
        )
        .input(
            "hyperparameters",
            SchemaFields::new("json_schema", json!({ "type": "object" })).optional(),
        )
        .output(
            "model",
            SchemaFields::new("protobuf", json!({ "message": "ModelArtifact" })),
        )
        .depends_on("load_dataset")
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[test]
fn same_fields_build_equal_manifests_except_generated_id() {
    init_tracing();
    let a = CapabilityManifest::new(training_fields()).unwrap();
    let b = CapabilityManifest::new(training_fields()).unwrap();

    assert_ne!(a.id(), b.id());
    assert_eq!(a.module_id(), b.module_id());
    assert_eq!(a.module_version(), b.module_version());
    assert_eq!(a.name(), b.name());
    assert_eq!(a.capability_type(), b.capability_type());
    assert_eq!(a.version(), b.version());
    assert_eq!(a.inputs(), b.inputs());
    assert_eq!(a.outputs(), b.outputs());
    assert_eq!(a.dependencies(), b.dependencies());
    assert_eq!(a.description(), b.description());
    assert_eq!(a.content_hash(), b.content_hash());
}

#[test]
fn same_fields_with_explicit_id_build_identical_manifests() {
    let id = Uuid::new_v4();
    let a = CapabilityManifest::new(training_fields().with_id(id)).unwrap();
    let b = CapabilityManifest::new(training_fields().with_id(id)).unwrap();
    assert_eq!(a, b);
}

// ---------------------------------------------------------------------------
// Per-kind schema rules at construction
// ---------------------------------------------------------------------------

#[test]
fn openapi_body_without_version_fails_construction() {
    init_tracing();
    let fields = training_fields().input(
        "endpoint",
        SchemaFields::new("openapi", json!({ "info": { "title": "Predict" }, "paths": {} })),
    );
    let err = CapabilityManifest::new(fields).unwrap_err();
    let violation = err.at("inputs.endpoint").expect("violation at inputs.endpoint");
    assert_eq!(
        violation.kind,
        ViolationKind::Schema(SchemaValidationError::MissingOpenApiVersion)
    );
}

#[test]
fn json_schema_body_without_identifier_gets_default_injected() {
    let fields = training_fields().output(
        "metrics",
        SchemaFields::new("json_schema", json!({ "type": "object", "properties": {} })),
    );
    let manifest = CapabilityManifest::new(fields).unwrap();
    let metrics = &manifest.outputs()["metrics"];
    assert_eq!(
        metrics.body().get("$schema"),
        Some(&json!("http://json-schema.org/draft-07/schema#"))
    );
    assert_eq!(metrics.body().get("type"), Some(&json!("object")));
}

#[test]
fn openapi_body_with_version_is_accepted_unchanged() {
    let fields = training_fields().input(
        "endpoint",
        SchemaFields::new("openapi", json!({ "openapi": "3.0.3", "paths": {} })),
    );
    let manifest = CapabilityManifest::new(fields).unwrap();
    let endpoint = &manifest.inputs()["endpoint"];
    assert_eq!(endpoint.kind(), SchemaKind::OpenApi);
    assert_eq!(endpoint.body().len(), 2);
}

// ---------------------------------------------------------------------------
// Capability taxonomy
// ---------------------------------------------------------------------------

#[test]
fn unknown_capability_type_fails_construction() {
    init_tracing();
    let mut fields = training_fields();
    fields.capability_type = "unknown_type".to_owned();

    let result = CapabilityManifest::new(fields);
    let err = result.expect_err("unknown capability type must be rejected");
    let violation = err.at("capability_type").unwrap();
    assert!(violation.message.contains("unknown capability type 'unknown_type'"));
}

#[test]
fn every_capability_type_tag_is_accepted() {
    for ty in CapabilityType::ALL {
        let mut fields = training_fields();
        fields.capability_type = ty.as_str().to_owned();
        let manifest = CapabilityManifest::new(fields).unwrap();
        assert_eq!(manifest.capability_type(), ty);
    }
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

#[test]
fn invalid_versions_name_field_and_text() {
    let mut fields = training_fields();
    fields.version = "2.1".to_owned();
    fields.module_version = "v4.2.0".to_owned();

    let err = CapabilityManifest::new(fields).unwrap_err();
    assert_eq!(err.violations().len(), 2);

    match &err.at("version").unwrap().kind {
        ViolationKind::InvalidVersion(e) => {
            assert_eq!(e.field, VersionField::Version);
            assert_eq!(e.text, "2.1");
        }
        other => panic!("unexpected violation kind: {other:?}"),
    }
    match &err.at("module_version").unwrap().kind {
        ViolationKind::InvalidVersion(e) => {
            assert_eq!(e.field, VersionField::ModuleVersion);
            assert_eq!(e.text, "v4.2.0");
        }
        other => panic!("unexpected violation kind: {other:?}"),
    }
}

#[test]
fn capability_and_module_versions_are_independent() {
    let manifest = CapabilityManifest::new(training_fields()).unwrap();
    assert_eq!(manifest.version().to_string(), "2.1.0");
    assert_eq!(manifest.module_version().to_string(), "4.2.0");
}

// ---------------------------------------------------------------------------
// Aggregate reporting and JSON ingestion
// ---------------------------------------------------------------------------

#[test]
fn json_record_with_many_defects_reports_all_of_them() {
    let json = r#"{
        "module_id": "trainer",
        "module_version": "4.2.0",
        "name": "",
        "capability_type": "quantum",
        "version": "2.1.0",
        "inputs": {
            "spec": { "schema_type": "openapi", "schema_definition": {} },
            "rows": { "schema_type": "csv", "schema_definition": { "sep": "," } }
        },
        "outputs": {
            "model": { "schema_type": "protobuf", "schema_definition": {} }
        }
    }"#;

    match CapabilityManifest::from_json(json) {
        Err(ManifestError::Invalid(err)) => {
            let paths: Vec<&str> = err.violations().iter().map(|v| v.path.as_str()).collect();
            assert_eq!(
                paths,
                [
                    "name",
                    "capability_type",
                    "inputs.rows.schema_type",
                    "inputs.spec",
                    "outputs.model",
                ]
            );
        }
        other => panic!("expected aggregated validation error, got {other:?}"),
    }
}

#[test]
fn json_record_with_optional_fields_omitted_uses_defaults() {
    let json = r#"{
        "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
        "module_id": "audit",
        "module_version": "1.0.0",
        "name": "check_rows",
        "capability_type": "validation",
        "version": "0.1.0",
        "inputs": {
            "rows": { "schema_type": "json_schema", "schema_definition": { "type": "array" } }
        }
    }"#;
    let manifest = CapabilityManifest::from_json(json).unwrap();
    assert_eq!(
        manifest.id(),
        Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap()
    );
    assert!(manifest.inputs()["rows"].required());
    assert!(manifest.outputs().is_empty());
    assert!(manifest.dependencies().is_empty());
    assert_eq!(manifest.description(), None);
}
