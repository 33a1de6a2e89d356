//! Bundle reading and writing utilities.
//!
//! Bundles are ZIP archives. Evidence is stored under `evidence/`, the four
//! generated documents at the top level. Writing goes to a temporary file in
//! the destination directory which is renamed into place only once the
//! archive is complete, so a failed run never leaves a bundle behind.

use evibundle_bundle_schema::{
    render_summary, validation, Bundle, EvidenceFile, HashListing, Manifest, Metadata, RawBundle,
    EVIDENCE_PREFIX, HASHES_FILE, MANIFEST_FILE, METADATA_FILE, SUMMARY_FILE,
};
use evibundle_common::hash::{sha256_reader, HashingReader};
use evibundle_common::{Error, Result, Timestamp};
use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime as ZipDateTime, ZipArchive, ZipWriter};

/// Entries at or above this size need ZIP64 extensions.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// The generated documents of a bundle, rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Documents {
    pub manifest: String,
    pub metadata: String,
    pub hashes: String,
    pub summary: String,
}

impl Documents {
    pub fn render(manifest: &Manifest, metadata: &Metadata) -> Result<Self> {
        Ok(Self {
            manifest: manifest.to_json_pretty()?,
            metadata: metadata.to_json_pretty()?,
            hashes: HashListing::from_manifest(manifest).render(),
            summary: render_summary(manifest, metadata),
        })
    }
}

/// Write a bundle to `path`.
///
/// Evidence is re-read from disk and re-hashed while it is archived; any
/// difference from the manifest aborts the write.
pub fn write_bundle(
    path: &Path,
    manifest: &Manifest,
    documents: &Documents,
    overwrite: bool,
) -> Result<()> {
    if !overwrite && path.exists() {
        return Err(Error::Input(format!(
            "output {} already exists (use --force to replace it)",
            path.display()
        )));
    }

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(parent).map_err(|e| {
        Error::archive(
            format!("cannot create temporary file in {}", parent.display()),
            e,
        )
    })?;
    debug!("Staging bundle at {}", tmp.path().display());

    let mut archive = ZipWriter::new(tmp);
    let options = entry_options(manifest.generated_at);

    for file in &manifest.files {
        add_evidence(&mut archive, file, options)?;
    }

    add_document(&mut archive, MANIFEST_FILE, &documents.manifest, options)?;
    add_document(&mut archive, METADATA_FILE, &documents.metadata, options)?;
    add_document(&mut archive, HASHES_FILE, &documents.hashes, options)?;
    add_document(&mut archive, SUMMARY_FILE, &documents.summary, options)?;

    let tmp = archive
        .finish()
        .map_err(|e| Error::archive("failed to finalize archive", e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::archive("failed to flush archive", e))?;

    let persisted = if overwrite {
        tmp.persist(path)
    } else {
        tmp.persist_noclobber(path)
    };
    persisted.map_err(|e| {
        Error::archive(format!("cannot move bundle into {}", path.display()), e.error)
    })?;

    info!("Bundle written successfully");
    Ok(())
}

fn entry_options(generated_at: Timestamp) -> SimpleFileOptions {
    let (year, month, day, hour, minute, second) = generated_at.calendar_parts();
    let modified = u16::try_from(year)
        .ok()
        .and_then(|year| {
            ZipDateTime::from_date_and_time(
                year,
                month as u8,
                day as u8,
                hour as u8,
                minute as u8,
                second as u8,
            )
            .ok()
        })
        .unwrap_or_else(|| {
            warn!(
                "Generation time {} not representable in ZIP, using 1980-01-01",
                generated_at
            );
            ZipDateTime::default()
        });

    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(modified)
        .unix_permissions(0o644)
}

fn add_evidence<W: Write + Seek>(
    archive: &mut ZipWriter<W>,
    file: &EvidenceFile,
    options: SimpleFileOptions,
) -> Result<()> {
    let meta = fs::symlink_metadata(&file.source_path)
        .map_err(|e| Error::archive(format!("{} vanished before archiving", file.path), e))?;
    if !meta.is_file() {
        return Err(Error::Archive(format!(
            "{} is no longer a regular file",
            file.path
        )));
    }
    if meta.len() != file.size {
        return Err(Error::Consistency {
            path: file.path.clone(),
            detail: format!("size was {} bytes, now {}", file.size, meta.len()),
        });
    }

    let source = File::open(&file.source_path)
        .map_err(|e| Error::archive(format!("cannot reopen {}", file.path), e))?;

    let bundle_path = file.bundle_path();
    archive
        .start_file(
            bundle_path.clone(),
            options.large_file(file.size >= ZIP64_THRESHOLD),
        )
        .map_err(|e| Error::archive(format!("failed to add {} to archive", bundle_path), e))?;

    let mut reader = HashingReader::new(source);
    io::copy(&mut reader, archive)
        .map_err(|e| Error::archive(format!("failed to write {} to archive", bundle_path), e))?;

    let archived = reader.finish();
    if archived.sha256 != file.sha256 {
        return Err(Error::Consistency {
            path: file.path.clone(),
            detail: format!("hashed as {}, archived as {}", file.sha256, archived.sha256),
        });
    }
    if archived.size != file.size {
        return Err(Error::Consistency {
            path: file.path.clone(),
            detail: format!("size was {} bytes, archived {}", file.size, archived.size),
        });
    }

    debug!("Archived {} ({} bytes)", bundle_path, archived.size);
    Ok(())
}

fn add_document<W: Write + Seek>(
    archive: &mut ZipWriter<W>,
    name: &str,
    content: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    archive
        .start_file(name, options)
        .map_err(|e| Error::archive(format!("failed to add {} to archive", name), e))?;
    archive
        .write_all(content.as_bytes())
        .map_err(|e| Error::archive(format!("failed to write {} to archive", name), e))?;
    Ok(())
}

/// Read a bundle's entries without interpreting them: the top-level
/// documents as text, and a digest of every evidence entry.
pub fn read_raw_bundle(path: &Path) -> Result<RawBundle> {
    let file = File::open(path)
        .map_err(|e| Error::Input(format!("cannot open bundle {}: {}", path.display(), e)))?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        Error::Input(format!("{} is not a readable ZIP archive: {}", path.display(), e))
    })?;

    let mut raw = RawBundle::default();
    for idx in 0..archive.len() {
        let mut entry = archive
            .by_index(idx)
            .map_err(|e| Error::Input(format!("cannot read entry {}: {}", idx, e)))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();

        if name.starts_with(EVIDENCE_PREFIX) {
            let digest = sha256_reader(&mut entry)
                .map_err(|e| Error::Input(format!("cannot read {}: {}", name, e)))?;
            if raw.evidence.insert(name.clone(), digest).is_some() {
                warn!("Duplicate bundle entry {}", name);
            }
            continue;
        }

        match name.as_str() {
            MANIFEST_FILE | METADATA_FILE | HASHES_FILE | SUMMARY_FILE => {
                let text = read_text(&mut entry, &name)?;
                raw.documents.insert(name, text);
            }
            _ => warn!("Ignoring unexpected bundle entry {}", name),
        }
    }

    Ok(raw)
}

/// Read a bundle back from disk, hashing every evidence entry. A missing or
/// malformed document is an error.
pub fn read_bundle(path: &Path) -> Result<Bundle> {
    read_raw_bundle(path)?.into_bundle()
}

fn read_text<R: Read>(reader: &mut R, name: &str) -> Result<String> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|e| Error::Input(format!("cannot read {}: {}", name, e)))?;
    Ok(content)
}

/// Validate a bundle file. Only an unreadable archive is an error; every
/// problem with its contents is reported in the result.
pub fn validate_bundle_file(path: &Path) -> Result<validation::ValidationResult> {
    let raw = read_raw_bundle(path)?;
    validation::validate_raw_bundle(&raw).map_err(|e| Error::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use evibundle_bundle_schema::{build_manifest, CaseInfo};
    use evibundle_common::hash::sha256_file;
    use tempfile::tempdir;

    fn hashed(dir: &Path, name: &str, content: &str) -> EvidenceFile {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        let digest = sha256_file(&path).unwrap();
        EvidenceFile::new(name, path, digest.sha256, digest.size)
    }

    fn documents_for(files: Vec<EvidenceFile>) -> (Manifest, Documents) {
        let case = CaseInfo::default();
        let ts = Timestamp::parse("2025-01-01T00:00:00Z").unwrap();
        let manifest = build_manifest(files, &case, ts);
        let metadata = Metadata::new(&case, ts, "evibundle test");
        let documents = Documents::render(&manifest, &metadata).unwrap();
        (manifest, documents)
    }

    #[test]
    fn test_write_read_bundle() {
        let dir = tempdir().unwrap();
        let files = vec![hashed(dir.path(), "log.txt", "hello")];
        let (manifest, documents) = documents_for(files);
        let bundle_path = dir.path().join("out.zip");

        write_bundle(&bundle_path, &manifest, &documents, false).unwrap();
        let bundle = read_bundle(&bundle_path).unwrap();

        assert_eq!(bundle.manifest, {
            let mut m = manifest.clone();
            m.files[0].source_path = Default::default();
            m
        });
        assert_eq!(bundle.evidence["evidence/log.txt"].size, 5);
        assert_eq!(bundle.hashes.len(), 1);
        assert!(validate_bundle_file(&bundle_path).unwrap().valid);
    }

    #[test]
    fn test_existing_output_is_kept_without_overwrite() {
        let dir = tempdir().unwrap();
        let (manifest, documents) = documents_for(vec![]);
        let bundle_path = dir.path().join("out.zip");
        fs::write(&bundle_path, "previous").unwrap();

        let err = write_bundle(&bundle_path, &manifest, &documents, false).unwrap_err();
        assert_eq!(err.kind(), "InputError");
        assert_eq!(fs::read_to_string(&bundle_path).unwrap(), "previous");

        write_bundle(&bundle_path, &manifest, &documents, true).unwrap();
        assert!(read_bundle(&bundle_path).is_ok());
    }

    #[test]
    fn test_changed_content_is_consistency_error() {
        let dir = tempdir().unwrap();
        let file = hashed(dir.path(), "log.txt", "hello");
        fs::write(&file.source_path, "jello").unwrap();
        let (manifest, documents) = documents_for(vec![file]);
        let bundle_path = dir.path().join("out.zip");

        let err = write_bundle(&bundle_path, &manifest, &documents, false).unwrap_err();
        assert_eq!(err.kind(), "ConsistencyError");
        assert!(!bundle_path.exists());
    }

    #[test]
    fn test_vanished_file_is_archive_error() {
        let dir = tempdir().unwrap();
        let file = hashed(dir.path(), "log.txt", "hello");
        fs::remove_file(&file.source_path).unwrap();
        let (manifest, documents) = documents_for(vec![file]);
        let bundle_path = dir.path().join("out.zip");

        let err = write_bundle(&bundle_path, &manifest, &documents, false).unwrap_err();
        assert_eq!(err.kind(), "ArchiveError");
        assert!(!bundle_path.exists());
        // Only the (now removed) evidence was ever in the directory
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unwritable_destination_is_archive_error() {
        let dir = tempdir().unwrap();
        let (manifest, documents) = documents_for(vec![]);
        let bundle_path = dir.path().join("no-such-dir").join("out.zip");

        let err = write_bundle(&bundle_path, &manifest, &documents, false).unwrap_err();
        assert_eq!(err.kind(), "ArchiveError");
    }

    #[test]
    fn test_read_non_zip_is_input_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bogus.zip");
        fs::write(&path, "not a zip").unwrap();
        assert_eq!(read_bundle(&path).unwrap_err().kind(), "InputError");
    }

    #[test]
    fn test_missing_summary_fails_validation() {
        let dir = tempdir().unwrap();
        let files = vec![hashed(dir.path(), "log.txt", "hello")];
        let (manifest, documents) = documents_for(files);
        let bundle_path = dir.path().join("partial.zip");

        let mut archive = ZipWriter::new(File::create(&bundle_path).unwrap());
        let options = entry_options(manifest.generated_at);
        add_evidence(&mut archive, &manifest.files[0], options).unwrap();
        add_document(&mut archive, MANIFEST_FILE, &documents.manifest, options).unwrap();
        add_document(&mut archive, METADATA_FILE, &documents.metadata, options).unwrap();
        add_document(&mut archive, HASHES_FILE, &documents.hashes, options).unwrap();
        archive.finish().unwrap();

        let result = validate_bundle_file(&bundle_path).unwrap();
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1, "Errors: {:?}", result.errors);
        assert!(result.errors[0].to_string().contains(SUMMARY_FILE));
        assert_eq!(read_bundle(&bundle_path).unwrap_err().kind(), "InputError");
    }
}
