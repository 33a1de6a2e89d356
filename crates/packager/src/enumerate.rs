//! Evidence directory enumeration.
//!
//! Only regular files are collected. Symbolic links are neither followed
//! nor bundled, and FIFOs, sockets and device nodes are skipped.

use evibundle_common::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A regular file found under the evidence directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the evidence directory, `/`-separated.
    pub rel_path: String,
    /// Path on disk.
    pub path: PathBuf,
}

/// List every regular file under `source_dir`, ordered byte-wise by
/// relative path.
pub fn enumerate(source_dir: &Path) -> Result<Vec<SourceFile>> {
    let meta = fs::metadata(source_dir).map_err(|e| {
        Error::Input(format!(
            "evidence directory {} is not accessible: {}",
            source_dir.display(),
            e
        ))
    })?;
    if !meta.is_dir() {
        return Err(Error::Input(format!(
            "{} is not a directory",
            source_dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(source_dir).follow_links(false) {
        let entry = entry
            .map_err(|e| Error::Input(format!("failed to walk {}: {}", source_dir.display(), e)))?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }
        if file_type.is_symlink() {
            debug!("Skipping symlink {}", entry.path().display());
            continue;
        }
        if !file_type.is_file() {
            debug!("Skipping special file {}", entry.path().display());
            continue;
        }

        let rel = entry.path().strip_prefix(source_dir).map_err(|_| {
            Error::Input(format!(
                "{} is outside {}",
                entry.path().display(),
                source_dir.display()
            ))
        })?;
        files.push(SourceFile {
            rel_path: normalize_rel_path(rel)?,
            path: entry.path().to_path_buf(),
        });
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    for paths in case_collisions(&files) {
        warn!(
            "Paths differ only by case and may collide on extraction: {}",
            paths.join(", ")
        );
    }
    debug!("Enumerated {} files under {}", files.len(), source_dir.display());

    Ok(files)
}

/// Join path components with `/`. Non-UTF-8 names are rejected because
/// they cannot be represented in the manifest.
fn normalize_rel_path(rel: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(name) => {
                let name = name.to_str().ok_or_else(|| {
                    Error::Input(format!("file name is not valid UTF-8: {}", rel.display()))
                })?;
                parts.push(name);
            }
            Component::CurDir => {}
            _ => {
                return Err(Error::Input(format!(
                    "unexpected path component in {}",
                    rel.display()
                )))
            }
        }
    }
    Ok(parts.join("/"))
}

/// Groups of paths differing only by case. These would overwrite each other
/// when the bundle is extracted on a case-insensitive filesystem; they are
/// kept, but flagged.
fn case_collisions(files: &[SourceFile]) -> Vec<Vec<&str>> {
    let mut folded: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for file in files {
        folded
            .entry(file.rel_path.to_lowercase())
            .or_default()
            .push(&file.rel_path);
    }
    folded.into_values().filter(|paths| paths.len() > 1).collect()
}
