//! JSON schema definitions for bundle validation.

/// JSON Schema for manifest.json.
pub const MANIFEST_SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "$id": "https://evibundle.dev/schemas/manifest.json",
  "title": "Evidence Bundle Manifest",
  "type": "object",
  "required": ["schema_version", "case_id", "analyst", "source", "generated_at", "file_count", "total_bytes", "files"],
  "properties": {
    "schema_version": {
      "type": "string",
      "pattern": "^\\d+\\.\\d+\\.\\d+$"
    },
    "case_id": { "type": "string", "minLength": 1 },
    "analyst": { "type": "string" },
    "source": { "type": "string" },
    "generated_at": {
      "type": "string",
      "format": "date-time"
    },
    "file_count": { "type": "integer", "minimum": 0 },
    "total_bytes": { "type": "integer", "minimum": 0 },
    "files": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["path", "size", "sha256", "kind"],
        "additionalProperties": false,
        "properties": {
          "path": { "type": "string", "minLength": 1 },
          "size": { "type": "integer", "minimum": 0 },
          "sha256": { "type": "string", "pattern": "^[0-9a-f]{64}$" },
          "kind": { "type": "string", "minLength": 1 }
        }
      }
    }
  }
}"#;

/// JSON Schema for metadata.json.
pub const METADATA_SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "$id": "https://evibundle.dev/schemas/metadata.json",
  "title": "Evidence Bundle Metadata",
  "type": "object",
  "required": ["case_id", "analyst", "source", "notes", "created_at", "tool_version"],
  "additionalProperties": false,
  "properties": {
    "case_id": { "type": "string", "minLength": 1 },
    "analyst": { "type": "string" },
    "source": { "type": "string" },
    "notes": { "type": "string" },
    "created_at": {
      "type": "string",
      "format": "date-time"
    },
    "tool_version": { "type": "string" }
  }
}"#;

/// Get the manifest schema as a parsed JSON value.
pub fn manifest_schema() -> serde_json::Value {
    serde_json::from_str(MANIFEST_SCHEMA).expect("Invalid manifest schema")
}

/// Get the metadata schema as a parsed JSON value.
pub fn metadata_schema() -> serde_json::Value {
    serde_json::from_str(METADATA_SCHEMA).expect("Invalid metadata schema")
}
