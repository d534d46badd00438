/*!
 * Remote object store abstraction for Webinator
 *
 * The sync core only needs two remote operations: a paginated object
 * listing (to build the manifest) and a file upload. Backends:
 * - In-memory store (tests, local rehearsal)
 * - AWS S3 and S3-compatible services (feature `s3-native`)
 */

mod error;
pub mod memory;

#[cfg(feature = "s3-native")]
pub mod s3;

use async_trait::async_trait;
use std::path::PathBuf;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

/// One object as reported by the store's listing API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Object key
    pub key: String,

    /// Server-reported ETag, verbatim
    pub etag: String,
}

/// A single page of a paginated listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Objects on this page (may be empty)
    pub objects: Vec<RemoteObject>,

    /// Token for the next page, `None` when the listing is exhausted
    pub next_token: Option<String>,
}

/// Everything a store needs to ingest one local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub bucket: String,
    pub key: String,
    pub local_path: PathBuf,
    pub content_type: String,

    /// Multipart threshold and part size; must equal the fingerprint chunk size
    pub chunk_size: usize,
}

/// Remote store interface consumed by the sync core
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch one page of the bucket listing
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> StoreResult<ObjectPage>;

    /// Upload a local file
    async fn upload(&self, request: &UploadRequest) -> StoreResult<()>;

    /// Get store name for logging
    fn store_name(&self) -> &'static str;
}
