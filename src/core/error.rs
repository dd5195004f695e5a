//! Error handling for republishing
//!
//! Classified error kinds for the pre-flight checks and the per-version
//! pipeline, built on the thiserror crate.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for republish operations
#[derive(Error, Debug)]
pub enum RepublishError {
    // Pre-flight errors
    #[error("{0}")]
    Usage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no published versions of {package} were found in the registry")]
    EmptyVersionList { package: String },

    #[error("no versions left to process after filtering")]
    EmptySelection,

    // Manifest errors
    #[error("failed to parse {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    #[error("{}: field `{field}` {message}", path.display())]
    ManifestField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },

    // Archive errors
    #[error("pack output not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("unexpected archive layout, missing directory: {}", .0.display())]
    ArchiveLayout(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepublishError {
    /// Shorthand for a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Whether this error ends the whole run rather than a single version
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Usage(_) | Self::Config(_) | Self::EmptyVersionList { .. } | Self::EmptySelection
        )
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Usage(_) => "USAGE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::EmptyVersionList { .. } => "EMPTY_VERSION_LIST",
            Self::EmptySelection => "EMPTY_SELECTION",
            Self::ManifestParse { .. } => "MANIFEST_PARSE_ERROR",
            Self::ManifestField { .. } => "MANIFEST_FIELD_ERROR",
            Self::ArchiveNotFound(_) => "ARCHIVE_NOT_FOUND",
            Self::ArchiveLayout(_) => "ARCHIVE_LAYOUT",
            Self::Io(_) => "IO_ERROR",
        }
    }
}
