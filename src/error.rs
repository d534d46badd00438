/*!
 * Error types for Webinator
 */

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::core::sync::SyncReport;
use crate::protocol::StoreError;

pub type Result<T> = std::result::Result<T, WebinatorError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug)]
pub enum WebinatorError {
    /// Sync root not found
    SourceNotFound(PathBuf),

    /// Sync root exists but is not a directory
    NotADirectory(PathBuf),

    /// I/O error
    Io(io::Error),

    /// Directory traversal failed below the sync root
    Walk { path: PathBuf, source: io::Error },

    /// Configuration error
    Config(String),

    /// The remote listing could not be completed
    ManifestLoad { bucket: String, source: StoreError },

    /// Remote store error outside of manifest loading
    Store(StoreError),

    /// A single file failed and the run is configured to abort
    FileFailed {
        key: String,
        reason: String,
        /// Files finished before the run stopped, the failing one included
        report: Box<SyncReport>,
    },
}

impl WebinatorError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            WebinatorError::SourceNotFound(_)
            | WebinatorError::NotADirectory(_)
            | WebinatorError::Config(_)
            | WebinatorError::ManifestLoad { .. } => EXIT_FATAL,
            _ => EXIT_PARTIAL,
        }
    }

    /// Partial run summary carried by a fail-fast abort
    pub fn partial_report(&self) -> Option<&SyncReport> {
        match self {
            WebinatorError::FileFailed { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            WebinatorError::SourceNotFound(_) | WebinatorError::NotADirectory(_) => {
                ErrorCategory::Validation
            }
            WebinatorError::Io(_) | WebinatorError::Walk { .. } => ErrorCategory::IoError,
            WebinatorError::Config(_) => ErrorCategory::Configuration,
            WebinatorError::ManifestLoad { .. } | WebinatorError::Store(_) => {
                ErrorCategory::Network
            }
            WebinatorError::FileFailed { .. } => ErrorCategory::Transfer,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Path validation errors
    Validation,
    /// Local I/O errors (walk or hash)
    IoError,
    /// Configuration errors
    Configuration,
    /// Remote store errors
    Network,
    /// Per-file transfer failures
    Transfer,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Transfer => write!(f, "transfer"),
        }
    }
}

impl fmt::Display for WebinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebinatorError::SourceNotFound(path) => {
                write!(f, "Source not found: {}", path.display())
            }
            WebinatorError::NotADirectory(path) => {
                write!(f, "Not a directory: {}", path.display())
            }
            WebinatorError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
            WebinatorError::Walk { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            WebinatorError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            WebinatorError::ManifestLoad { bucket, source } => {
                write!(f, "Failed to load manifest for bucket {}: {}", bucket, source)
            }
            WebinatorError::Store(err) => {
                write!(f, "Remote store error: {}", err)
            }
            WebinatorError::FileFailed { key, reason, .. } => {
                write!(f, "Sync aborted at {}: {}", key, reason)
            }
        }
    }
}

impl std::error::Error for WebinatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WebinatorError::Io(err) => Some(err),
            WebinatorError::Walk { source, .. } => Some(source),
            WebinatorError::ManifestLoad { source, .. } => Some(source),
            WebinatorError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for WebinatorError {
    fn from(err: io::Error) -> Self {
        WebinatorError::Io(err)
    }
}

impl From<StoreError> for WebinatorError {
    fn from(err: StoreError) -> Self {
        WebinatorError::Store(err)
    }
}

impl From<toml::de::Error> for WebinatorError {
    fn from(err: toml::de::Error) -> Self {
        WebinatorError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for WebinatorError {
    fn from(err: toml::ser::Error) -> Self {
        WebinatorError::Config(format!("TOML serialize error: {}", err))
    }
}
