//! Evidence file records.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory prefix under which evidence files are stored in a bundle.
pub const EVIDENCE_PREFIX: &str = "evidence/";

/// A hashed file from the evidence directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceFile {
    /// Path relative to the evidence directory, `/`-separated.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// SHA256 hash of the content.
    pub sha256: String,
    /// Lower-cased file extension, or `no_ext`.
    pub kind: String,
    /// Where the file was read from (only present in memory).
    #[serde(skip)]
    pub source_path: PathBuf,
}

impl EvidenceFile {
    pub fn new(
        path: impl Into<String>,
        source_path: impl Into<PathBuf>,
        sha256: impl Into<String>,
        size: u64,
    ) -> Self {
        let path = path.into();
        let kind = file_kind(&path);
        Self {
            path,
            size,
            sha256: sha256.into(),
            kind,
            source_path: source_path.into(),
        }
    }

    /// Path of this file inside the bundle.
    pub fn bundle_path(&self) -> String {
        format!("{}{}", EVIDENCE_PREFIX, self.path)
    }
}

/// Classify a file by its extension.
pub fn file_kind(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "no_ext".to_string())
}
