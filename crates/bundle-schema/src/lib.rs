//! Bundle schema definitions for evibundle.
//!
//! This crate defines the documents written into an evidence bundle:
//! the manifest, the case metadata record, the flat hash listing and the
//! human-readable summary, plus validation of a bundle read back from disk.

pub mod evidence;
pub mod hashlist;
pub mod manifest;
pub mod metadata;
pub mod schema;
pub mod summary;
pub mod validation;

pub use evidence::{file_kind, EvidenceFile, EVIDENCE_PREFIX};
pub use hashlist::{HashLine, HashListing};
pub use manifest::{build_manifest, Bundle, Manifest, RawBundle, SCHEMA_VERSION};
pub use metadata::{CaseInfo, Metadata};
pub use summary::render_summary;
pub use validation::{validate_bundle, validate_raw_bundle};

/// File name of the manifest inside a bundle.
pub const MANIFEST_FILE: &str = "manifest.json";
/// File name of the metadata record inside a bundle.
pub const METADATA_FILE: &str = "metadata.json";
/// File name of the hash listing inside a bundle.
pub const HASHES_FILE: &str = "hashes.sha256";
/// File name of the summary inside a bundle.
pub const SUMMARY_FILE: &str = "summary.md";
