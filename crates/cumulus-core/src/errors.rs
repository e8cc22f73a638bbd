//! Error taxonomy for the upload surface.
//!
//! Three conditions are distinguishable by callers:
//! - FolderNotFound: the upload root is missing or not a directory
//! - InvalidUploadId: a job key unknown to the registry
//! - UploadFailed: a file or segment never reached the store
//!
//! Cancellation is not represented here; it is not a fault.

use std::path::PathBuf;

/// Error raised by the public upload operations.
#[derive(Debug)]
pub enum UploadError {
    /// The requested upload root does not exist or is not a directory.
    FolderNotFound(PathBuf),
    /// The caller referenced a job key the registry has never issued.
    InvalidUploadId(String),
    /// A file or segment failed to reach the store; the owning job aborts.
    UploadFailed {
        /// Object name (or path) that failed.
        object: String,
        /// Opaque cause surfaced from the transport or filesystem.
        message: String,
    },
}

impl UploadError {
    /// Wrap a transport/filesystem fault for `object`.
    pub fn failed(object: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::UploadFailed {
            object: object.into(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FolderNotFound(path) => {
                write!(f, "upload folder not found: {}", path.display())
            }
            Self::InvalidUploadId(key) => write!(f, "unknown upload id: {key}"),
            Self::UploadFailed { object, message } => {
                write!(f, "upload of {object} failed: {message}")
            }
        }
    }
}

impl std::error::Error for UploadError {}

/// Result type for upload operations.
pub type UploadResult<T> = std::result::Result<T, UploadError>;
