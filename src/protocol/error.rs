//! Error types for remote store operations

use std::io;
use thiserror::Error;

/// Result type alias for remote store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to a remote object store
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// SDK error that could not be classified further
    #[error("SDK error: {0}")]
    Sdk(String),

    /// Service error with specific error code
    #[error("Store service error ({code}): {message}")]
    Service { code: String, message: String },

    /// Bucket not found or not accessible
    #[error("Bucket not found or not accessible: {0}")]
    BucketNotFound(String),

    /// Access denied error
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid bucket name
    #[error("Invalid bucket name: {0}")]
    InvalidBucketName(String),

    /// Multipart upload error
    #[error("Multipart upload error: {0}")]
    MultipartUpload(String),

    /// Local I/O error while streaming an upload
    #[error("I/O error: {0}")]
    Io(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Storage quota exceeded
    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<StoreError>,
    },
}

impl StoreError {
    /// Add context to an error
    pub fn context<S: Into<String>>(self, context: S) -> Self {
        StoreError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}
