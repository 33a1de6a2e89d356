//! Packaging configuration: case fields from flags and an optional case file.

use evibundle_bundle_schema::CaseInfo;
use evibundle_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Case fields read from a YAML case file. Every field is optional.
///
/// ```yaml
/// case_id: IR-2025-001
/// analyst: A. Analyst
/// source: SOC
/// notes: |
///   Host isolated before collection.
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseFile {
    pub case_id: Option<String>,
    pub analyst: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

impl CaseFile {
    /// Load a case file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// Case fields given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct CaseOverrides {
    pub case_id: Option<String>,
    pub analyst: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

/// Merge case fields: flags win over the case file, which wins over defaults.
pub fn resolve_case(file: Option<CaseFile>, overrides: CaseOverrides) -> Result<CaseInfo> {
    let defaults = CaseInfo::default();
    let file = file.unwrap_or_default();

    let case = CaseInfo {
        case_id: overrides
            .case_id
            .or(file.case_id)
            .unwrap_or(defaults.case_id),
        analyst: overrides
            .analyst
            .or(file.analyst)
            .unwrap_or(defaults.analyst),
        source: overrides.source.or(file.source).unwrap_or(defaults.source),
        notes: overrides.notes.or(file.notes).unwrap_or(defaults.notes),
    };

    if case.case_id.trim().is_empty() {
        return Err(Error::Config("case ID must not be empty".to_string()));
    }

    Ok(case)
}

/// Everything one packaging run needs.
#[derive(Debug, Clone)]
pub struct PackConfig {
    pub source_dir: PathBuf,
    pub output: PathBuf,
    pub case: CaseInfo,
    /// Replace an existing bundle at `output`.
    pub overwrite: bool,
}
