//! The packaging pipeline: enumerate, hash, build the manifest, archive.

use crate::bundle::{write_bundle, Documents};
use crate::config::PackConfig;
use crate::enumerate::{enumerate, SourceFile};
use crate::TOOL_VERSION;
use evibundle_bundle_schema::{build_manifest, EvidenceFile, Metadata};
use evibundle_common::hash::sha256_file;
use evibundle_common::{Error, Result, Timestamp};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Pipeline progress. A run only ever moves forward; a failure at any
/// point aborts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    Enumerated,
    Hashed,
    ManifestBuilt,
    Archived,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Enumerated => "enumerated",
            Stage::Hashed => "hashed",
            Stage::ManifestBuilt => "manifest-built",
            Stage::Archived => "archived",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PackReport {
    pub output: PathBuf,
    pub file_count: usize,
    pub total_bytes: u64,
}

/// Package an evidence directory into a bundle.
pub fn package_evidence(config: &PackConfig) -> Result<PackReport> {
    package_evidence_with(config, |_| {})
}

/// Package an evidence directory, calling `on_stage` after every stage
/// transition.
pub fn package_evidence_with<F>(config: &PackConfig, mut on_stage: F) -> Result<PackReport>
where
    F: FnMut(Stage),
{
    let mut stage = Stage::Start;
    let mut advance = |next: Stage| {
        debug!("Pipeline {} -> {}", stage, next);
        stage = next;
        on_stage(next);
    };

    let result = run(config, &mut advance);
    if let Err(ref e) = result {
        debug!("Pipeline aborted: {}", e);
    }
    result
}

fn run(config: &PackConfig, advance: &mut dyn FnMut(Stage)) -> Result<PackReport> {
    let generated_at = Timestamp::now();
    check_output_location(&config.source_dir, &config.output)?;

    info!(
        "Packaging {} for case {}",
        config.source_dir.display(),
        config.case.case_id
    );
    let sources = enumerate(&config.source_dir)?;
    advance(Stage::Enumerated);

    let files = hash_files(&sources)?;
    advance(Stage::Hashed);

    let manifest = build_manifest(files, &config.case, generated_at);
    let metadata = Metadata::new(&config.case, generated_at, TOOL_VERSION);
    let documents = Documents::render(&manifest, &metadata)?;
    advance(Stage::ManifestBuilt);

    write_bundle(&config.output, &manifest, &documents, config.overwrite)?;
    advance(Stage::Archived);

    info!(
        "Packaged {} files ({} bytes) into {}",
        manifest.file_count,
        manifest.total_bytes,
        config.output.display()
    );
    Ok(PackReport {
        output: config.output.clone(),
        file_count: manifest.file_count,
        total_bytes: manifest.total_bytes,
    })
}

/// Hash every enumerated file. The first unreadable file aborts the run.
pub fn hash_files(sources: &[SourceFile]) -> Result<Vec<EvidenceFile>> {
    sources
        .iter()
        .map(|source| {
            let digest = sha256_file(&source.path)?;
            debug!("{}  {}", digest.sha256, source.rel_path);
            Ok(EvidenceFile::new(
                source.rel_path.clone(),
                source.path.clone(),
                digest.sha256,
                digest.size,
            ))
        })
        .collect()
}

/// The bundle must not be written inside the directory it packages.
fn check_output_location(source_dir: &Path, output: &Path) -> Result<()> {
    let Ok(source) = source_dir.canonicalize() else {
        // enumerate() reports the missing source directory
        return Ok(());
    };
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if let Ok(parent) = parent.canonicalize() {
        if parent.starts_with(&source) {
            return Err(Error::Input(format!(
                "output {} is inside the evidence directory {}",
                output.display(),
                source_dir.display()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use evibundle_bundle_schema::CaseInfo;
    use std::fs;
    use tempfile::tempdir;

    fn config(source_dir: &Path, output: PathBuf) -> PackConfig {
        PackConfig {
            source_dir: source_dir.to_path_buf(),
            output,
            case: CaseInfo::default(),
            overwrite: false,
        }
    }

    #[test]
    fn test_stages_run_in_order() {
        let evidence = tempdir().unwrap();
        let out = tempdir().unwrap();
        fs::write(evidence.path().join("a.txt"), "a").unwrap();

        let mut seen = Vec::new();
        let report = package_evidence_with(
            &config(evidence.path(), out.path().join("b.zip")),
            |stage| seen.push(stage),
        )
        .unwrap();

        assert_eq!(
            seen,
            [
                Stage::Enumerated,
                Stage::Hashed,
                Stage::ManifestBuilt,
                Stage::Archived
            ]
        );
        assert_eq!(report.file_count, 1);
        assert_eq!(report.total_bytes, 1);
    }

    #[test]
    fn test_output_inside_source_rejected() {
        let evidence = tempdir().unwrap();
        let err = package_evidence(&config(evidence.path(), evidence.path().join("b.zip")))
            .unwrap_err();
        assert_eq!(err.kind(), "InputError");
        assert!(!evidence.path().join("b.zip").exists());
    }

    #[test]
    fn test_hash_files_keeps_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();

        let files = hash_files(&enumerate(dir.path()).unwrap()).unwrap();
        assert_eq!(files[0].path, "a.txt");
        assert_eq!(
            files[0].sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(files[1].size, 0);
        assert_eq!(
            files[1].sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
