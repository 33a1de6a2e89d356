//! Manifest types for the evidence bundle.

use crate::{
    CaseInfo, EvidenceFile, HashListing, Metadata, HASHES_FILE, MANIFEST_FILE, METADATA_FILE,
    SUMMARY_FILE,
};
use evibundle_common::hash::FileDigest;
use evibundle_common::{Error, Result, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current manifest schema version.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// A bundle read back from disk (in-memory representation).
#[derive(Debug, Clone)]
pub struct Bundle {
    pub manifest: Manifest,
    pub metadata: Metadata,
    pub hashes: HashListing,
    pub summary: String,
    /// Digests of the archived evidence, keyed by bundle path.
    pub evidence: BTreeMap<String, FileDigest>,
}

/// A bundle as stored in the archive: the top-level documents as text,
/// keyed by file name, and a digest of every evidence entry.
#[derive(Debug, Clone, Default)]
pub struct RawBundle {
    pub documents: BTreeMap<String, String>,
    pub evidence: BTreeMap<String, FileDigest>,
}

impl RawBundle {
    pub fn document(&self, name: &str) -> Result<&str> {
        self.documents
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::Input(format!("bundle is missing {}", name)))
    }

    /// Parse the documents. The first missing or malformed one is an error.
    pub fn into_bundle(self) -> Result<Bundle> {
        let manifest = serde_json::from_str(self.document(MANIFEST_FILE)?)?;
        let metadata = serde_json::from_str(self.document(METADATA_FILE)?)?;
        let hashes = HashListing::parse(self.document(HASHES_FILE)?)?;
        let summary = self.document(SUMMARY_FILE)?.to_string();
        Ok(Bundle {
            manifest,
            metadata,
            hashes,
            summary,
            evidence: self.evidence,
        })
    }
}

/// The manifest.json file - lists every evidence file in the bundle.
///
/// Everything except `generated_at` is a pure function of the evidence
/// bytes and the case fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Schema version for forward compatibility.
    pub schema_version: String,
    pub case_id: String,
    pub analyst: String,
    pub source: String,
    /// When the bundle was generated.
    pub generated_at: Timestamp,
    pub file_count: usize,
    pub total_bytes: u64,
    /// Evidence files, ordered by path.
    pub files: Vec<EvidenceFile>,
}

impl Manifest {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self).map(|mut s| {
            s.push('\n');
            s
        })
    }
}

/// Build the manifest for a set of hashed files.
///
/// Files are ordered by byte-wise comparison of their relative paths, the
/// same order the enumerator produces.
pub fn build_manifest(
    mut files: Vec<EvidenceFile>,
    case: &CaseInfo,
    generated_at: Timestamp,
) -> Manifest {
    files.sort_by(|a, b| a.path.cmp(&b.path));
    let total_bytes = files.iter().map(|f| f.size).sum();

    Manifest {
        schema_version: SCHEMA_VERSION.to_string(),
        case_id: case.case_id.clone(),
        analyst: case.analyst.clone(),
        source: case.source.clone(),
        generated_at,
        file_count: files.len(),
        total_bytes,
        files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn case() -> CaseInfo {
        CaseInfo {
            case_id: "IR-2025-001".into(),
            analyst: "A. Analyst".into(),
            source: "SOC".into(),
            notes: String::new(),
        }
    }

    fn files() -> Vec<EvidenceFile> {
        vec![
            EvidenceFile::new(
                "notes.txt",
                "/tmp/ev/notes.txt",
                "486ea46224d1bb4fb680f34f7c9ad96a8f24ec88be73ea8e5a6c65260e9cb8a7",
                5,
            ),
            EvidenceFile::new(
                "log.txt",
                "/tmp/ev/log.txt",
                "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
                5,
            ),
        ]
    }

    #[test]
    fn test_manifest_is_ordered_and_totalled() {
        let ts = Timestamp::parse("2025-01-01T00:00:00Z").unwrap();
        let manifest = build_manifest(files(), &case(), ts);

        let paths: Vec<&str> = manifest.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["log.txt", "notes.txt"]);
        assert_eq!(manifest.file_count, 2);
        assert_eq!(manifest.total_bytes, 10);
    }

    #[test]
    fn test_manifest_json_is_deterministic() {
        let ts = Timestamp::parse("2025-01-01T00:00:00Z").unwrap();
        let mut reversed = files();
        reversed.reverse();

        let a = build_manifest(files(), &case(), ts).to_json_pretty().unwrap();
        let b = build_manifest(reversed, &case(), ts).to_json_pretty().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_only_timestamp_differs_between_runs() {
        let early = Timestamp::parse("2025-01-01T00:00:00Z").unwrap();
        let late = Timestamp::parse("2025-06-01T08:00:00Z").unwrap();
        let first = build_manifest(files(), &case(), early);
        let mut second = build_manifest(files(), &case(), late);
        assert_ne!(first, second);

        second.generated_at = first.generated_at;
        assert_eq!(first.to_json_pretty().unwrap(), second.to_json_pretty().unwrap());
    }

    #[test]
    fn test_manifest_json_shape() {
        let ts = Timestamp::parse("2025-01-01T00:00:00Z").unwrap();
        let manifest = build_manifest(files(), &case(), ts);
        let json = serde_json::to_value(&manifest).unwrap();

        assert_eq!(json["case_id"], "IR-2025-001");
        assert_eq!(json["generated_at"], "2025-01-01T00:00:00Z");
        assert_eq!(json["files"][0]["path"], "log.txt");
        assert_eq!(json["files"][0]["size"], 5);

        let roundtrip: Manifest = serde_json::from_value(json).unwrap();
        assert_eq!(roundtrip.files[0].sha256, manifest.files[0].sha256);
    }
}
