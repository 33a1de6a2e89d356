//! Common error types for evibundle.

use std::path::PathBuf;
use thiserror::Error;

/// Common error type for evibundle operations.
///
/// Every variant is fatal to a packaging run. The first four are the
/// failure kinds reported to the operator; the rest are plumbing.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid source directory, or an unusable file listing.
    #[error("{0}")]
    Input(String),

    /// A file disappeared or became unreadable while it was being hashed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content changed between hashing and archiving.
    #[error("{path} changed after hashing: {detail}")]
    Consistency { path: String, detail: String },

    /// The output could not be written.
    #[error("{0}")]
    Archive(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using common Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an [`Error::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an [`Error::Archive`] from any displayable cause.
    pub fn archive(context: impl std::fmt::Display, cause: impl std::fmt::Display) -> Self {
        Error::Archive(format!("{}: {}", context, cause))
    }

    /// Name of the failure kind, as shown to the operator.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Input(_) => "InputError",
            Error::Io { .. } => "IOError",
            Error::Consistency { .. } => "ConsistencyError",
            Error::Archive(_) => "ArchiveError",
            Error::Json(_) => "SerializationError",
            Error::Config(_) => "ConfigError",
            Error::Other(_) => "Error",
        }
    }

    /// Process exit code for this failure kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Input(_) | Error::Config(_) => 2,
            Error::Io { .. } => 3,
            Error::Consistency { .. } => 4,
            Error::Archive(_) => 5,
            Error::Json(_) | Error::Other(_) => 1,
        }
    }
}
