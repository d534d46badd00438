/*!
 * Webinator - incremental static-site deployment to S3
 *
 * Uploads a local directory tree to a bucket, skipping files whose content
 * is already stored remotely:
 * - Local fingerprints computed with the same chunked MD5 scheme S3 uses for ETags
 * - One paginated listing per run builds the remote manifest
 * - Bounded concurrent fingerprinting and uploads with cancellation
 * - Content types inferred from file extensions
 * - Continue-with-report or fail-fast error handling
 */

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod region;

// Re-export commonly used types
pub use config::{ErrorMode, LogLevel, SyncConfig};
pub use core::{Fingerprint, Manifest, SyncReport, Syncer, TreeWalker, CHUNK_SIZE};
pub use error::{Result, WebinatorError};
pub use protocol::{MemoryStore, RemoteStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
