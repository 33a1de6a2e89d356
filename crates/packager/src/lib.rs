//! evibundle packager - gathers an evidence directory into a verifiable bundle.

pub mod bundle;
pub mod config;
pub mod enumerate;
pub mod pipeline;

pub use config::{CaseFile, CaseOverrides, PackConfig};
pub use pipeline::{package_evidence, PackReport, Stage};

/// Tool version recorded in every bundle's metadata.
pub const TOOL_VERSION: &str = concat!("evibundle ", env!("CARGO_PKG_VERSION"));
