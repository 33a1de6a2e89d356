//! Bundle validation utilities.

use crate::{
    schema, Bundle, HashListing, Manifest, Metadata, RawBundle, HASHES_FILE, MANIFEST_FILE,
    METADATA_FILE, SUMMARY_FILE,
};
use evibundle_common::hash::FileDigest;
use jsonschema::JSONSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Validation error type.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Schema validation failed: {0}")]
    SchemaError(String),

    #[error("Missing bundle entry: {0}")]
    MissingFile(String),

    #[error("Evidence file not listed in manifest: {0}")]
    UnlistedFile(String),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Size mismatch for {file}: expected {expected}, got {actual}")]
    SizeMismatch {
        file: String,
        expected: u64,
        actual: u64,
    },

    #[error("Manifest is not sorted or has duplicate path: {0}")]
    OrderViolation(String),

    #[error("Manifest totals disagree with its file list: {0}")]
    TotalsMismatch(String),

    #[error("Hash listing disagrees with manifest: {0}")]
    HashListingMismatch(String),

    #[error("Malformed {name}: {detail}")]
    MalformedDocument { name: String, detail: String },

    #[error("Case ID mismatch: manifest has {manifest}, metadata has {metadata}")]
    CaseMismatch { manifest: String, metadata: String },

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result of bundle validation.
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    fn merge(&mut self, other: ValidationResult) {
        for error in other.errors {
            self.add_error(error);
        }
        self.warnings.extend(other.warnings);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_against(
    schema_value: &Value,
    instance: &Value,
) -> Result<ValidationResult, ValidationError> {
    let mut result = ValidationResult::new();

    let compiled = JSONSchema::compile(schema_value)
        .map_err(|e| ValidationError::SchemaError(e.to_string()))?;

    let validation = compiled.validate(instance);
    if let Err(errors) = validation {
        for error in errors {
            result.add_error(ValidationError::SchemaError(format!(
                "{} at {}",
                error, error.instance_path
            )));
        }
    }

    Ok(result)
}

/// Validate a manifest against the JSON schema.
pub fn validate_manifest(manifest: &Value) -> Result<ValidationResult, ValidationError> {
    validate_against(&schema::manifest_schema(), manifest)
}

/// Validate a metadata record against the JSON schema.
pub fn validate_metadata(metadata: &Value) -> Result<ValidationResult, ValidationError> {
    validate_against(&schema::metadata_schema(), metadata)
}

/// Validate an in-memory bundle (documents + archived evidence).
pub fn validate_bundle(bundle: &Bundle) -> Result<ValidationResult, ValidationError> {
    let mut result = ValidationResult::new();

    result.merge(validate_manifest(&serde_json::to_value(&bundle.manifest)?)?);
    result.merge(validate_metadata(&serde_json::to_value(&bundle.metadata)?)?);

    check_contents(&bundle.manifest, &bundle.evidence, &mut result);
    check_case(&bundle.manifest, &bundle.metadata, &mut result);
    check_hash_listing(&bundle.hashes, &bundle.manifest, &mut result);
    check_summary(&bundle.summary, &bundle.manifest, &mut result);

    Ok(result)
}

/// Validate a bundle as read from its archive.
///
/// The JSON documents are checked against their schemas exactly as stored.
/// Missing or unparsable documents are reported as errors; the checks that
/// depend on them are skipped.
pub fn validate_raw_bundle(raw: &RawBundle) -> Result<ValidationResult, ValidationError> {
    let mut result = ValidationResult::new();

    for name in [MANIFEST_FILE, METADATA_FILE, HASHES_FILE, SUMMARY_FILE] {
        if !raw.documents.contains_key(name) {
            result.add_error(ValidationError::MissingFile(name.to_string()));
        }
    }

    let manifest: Option<Manifest> =
        check_json_document(raw, MANIFEST_FILE, validate_manifest, &mut result)?;
    let metadata: Option<Metadata> =
        check_json_document(raw, METADATA_FILE, validate_metadata, &mut result)?;
    let hashes = match raw.documents.get(HASHES_FILE).map(|text| HashListing::parse(text)) {
        Some(Ok(hashes)) => Some(hashes),
        Some(Err(e)) => {
            result.add_error(ValidationError::MalformedDocument {
                name: HASHES_FILE.to_string(),
                detail: e.to_string(),
            });
            None
        }
        None => None,
    };

    let Some(manifest) = manifest else {
        return Ok(result);
    };
    check_contents(&manifest, &raw.evidence, &mut result);
    if let Some(metadata) = &metadata {
        check_case(&manifest, metadata, &mut result);
    }
    if let Some(hashes) = &hashes {
        check_hash_listing(hashes, &manifest, &mut result);
    }
    if let Some(summary) = raw.documents.get(SUMMARY_FILE) {
        check_summary(summary, &manifest, &mut result);
    }

    Ok(result)
}

/// Schema-check one JSON document, then parse it.
fn check_json_document<T: DeserializeOwned>(
    raw: &RawBundle,
    name: &str,
    validate: fn(&Value) -> Result<ValidationResult, ValidationError>,
    result: &mut ValidationResult,
) -> Result<Option<T>, ValidationError> {
    let Some(text) = raw.documents.get(name) else {
        return Ok(None);
    };
    let malformed = |e: serde_json::Error| ValidationError::MalformedDocument {
        name: name.to_string(),
        detail: e.to_string(),
    };

    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            result.add_error(malformed(e));
            return Ok(None);
        }
    };
    let schema_result = validate(&value)?;
    let schema_valid = schema_result.valid;
    result.merge(schema_result);

    match serde_json::from_value(value) {
        Ok(document) => Ok(Some(document)),
        Err(e) => {
            // Schema errors already explain why
            if schema_valid {
                result.add_error(malformed(e));
            }
            Ok(None)
        }
    }
}

/// Order, totals, and agreement between the manifest and archived evidence.
fn check_contents(
    manifest: &Manifest,
    evidence: &BTreeMap<String, FileDigest>,
    result: &mut ValidationResult,
) {
    for pair in manifest.files.windows(2) {
        if pair[0].path >= pair[1].path {
            result.add_error(ValidationError::OrderViolation(pair[1].path.clone()));
        }
    }

    if manifest.file_count != manifest.files.len() {
        result.add_error(ValidationError::TotalsMismatch(format!(
            "file_count is {}, {} files listed",
            manifest.file_count,
            manifest.files.len()
        )));
    }
    let listed_bytes: u64 = manifest.files.iter().map(|f| f.size).sum();
    if manifest.total_bytes != listed_bytes {
        result.add_error(ValidationError::TotalsMismatch(format!(
            "total_bytes is {}, files sum to {}",
            manifest.total_bytes, listed_bytes
        )));
    }

    // Every listed file must be archived with the recorded content
    for file in &manifest.files {
        let bundle_path = file.bundle_path();
        match evidence.get(&bundle_path) {
            None => result.add_error(ValidationError::MissingFile(bundle_path)),
            Some(actual) => {
                if actual.sha256 != file.sha256 {
                    result.add_error(ValidationError::ChecksumMismatch {
                        file: bundle_path.clone(),
                        expected: file.sha256.clone(),
                        actual: actual.sha256.clone(),
                    });
                }
                if actual.size != file.size {
                    result.add_error(ValidationError::SizeMismatch {
                        file: bundle_path,
                        expected: file.size,
                        actual: actual.size,
                    });
                }
            }
        }
    }

    // ...and nothing else may hide under evidence/
    let listed = listed_digests(manifest);
    for path in evidence.keys() {
        if !listed.contains_key(path) {
            result.add_error(ValidationError::UnlistedFile(path.clone()));
        }
    }
}

fn check_case(manifest: &Manifest, metadata: &Metadata, result: &mut ValidationResult) {
    if manifest.case_id != metadata.case_id {
        result.add_error(ValidationError::CaseMismatch {
            manifest: manifest.case_id.clone(),
            metadata: metadata.case_id.clone(),
        });
    }
}

fn check_summary(summary: &str, manifest: &Manifest, result: &mut ValidationResult) {
    if !summary.contains(&manifest.case_id) {
        result.add_warning(format!(
            "{} does not mention case {}",
            SUMMARY_FILE, manifest.case_id
        ));
    }
}

/// Bundle path to recorded digest, for every manifest entry.
fn listed_digests(manifest: &Manifest) -> BTreeMap<String, &str> {
    manifest
        .files
        .iter()
        .map(|f| (f.bundle_path(), f.sha256.as_str()))
        .collect()
}

fn check_hash_listing(hashes: &HashListing, manifest: &Manifest, result: &mut ValidationResult) {
    let listed = listed_digests(manifest);
    if hashes.len() != listed.len() {
        result.add_error(ValidationError::HashListingMismatch(format!(
            "{} lines for {} files",
            hashes.len(),
            listed.len()
        )));
    }
    for line in &hashes.lines {
        match listed.get(&line.path) {
            None => result.add_error(ValidationError::HashListingMismatch(format!(
                "unknown path {}",
                line.path
            ))),
            Some(expected) if *expected != line.sha256 => {
                result.add_error(ValidationError::HashListingMismatch(format!(
                    "digest for {} differs",
                    line.path
                )))
            }
            Some(_) => {}
        }
    }
}
