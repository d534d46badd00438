//! In-memory remote store
//!
//! Keeps objects in memory and assigns ETags the way S3 does on ingest,
//! using the chunk size carried by each upload request. Used by tests and
//! for rehearsing a sync without network access.
//!
//! # Example
//!
//! ```rust
//! use webinator::protocol::{MemoryStore, RemoteStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!     store.insert_object("site", "index.html", "\"5d41402abc4b2a76b9719d911017c592\"");
//!
//!     let page = store.list_objects("site", None).await.unwrap();
//!     assert_eq!(page.objects.len(), 1);
//! }
//! ```

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{ObjectPage, RemoteObject, RemoteStore, StoreError, StoreResult, UploadRequest};
use crate::core::etag::Fingerprint;

/// Default number of keys returned per listing page (S3's maximum)
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Object held by the in-memory store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub etag: String,
    pub content_type: Option<String>,
    pub size: u64,
}

#[derive(Debug, Default)]
struct State {
    buckets: HashMap<String, BTreeMap<String, StoredObject>>,
    uploads: Vec<UploadRequest>,
    failing_keys: HashSet<String>,
    listing_error: Option<StoreError>,
}

/// In-memory [`RemoteStore`] implementation
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
    list_calls: Arc<AtomicUsize>,
    page_size: usize,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            list_calls: Arc::new(AtomicUsize::new(0)),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the number of keys per listing page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Seed an object with a verbatim ETag
    pub fn insert_object(&self, bucket: &str, key: &str, etag: &str) {
        self.write().buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                etag: etag.to_string(),
                content_type: None,
                size: 0,
            },
        );
    }

    /// Look up a stored object
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.read()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    /// Make uploads of `key` fail with an access error
    pub fn fail_uploads_for(&self, key: &str) {
        self.write().failing_keys.insert(key.to_string());
    }

    /// Make every listing call fail with `error`
    pub fn fail_listing(&self, error: StoreError) {
        self.write().listing_error = Some(error);
    }

    /// Every upload request received so far, in arrival order
    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.read().uploads.clone()
    }

    /// Number of upload requests received so far
    pub fn upload_count(&self) -> usize {
        self.read().uploads.len()
    }

    /// Forget recorded upload requests, keeping stored objects
    pub fn clear_uploads(&self) {
        self.write().uploads.clear();
    }

    /// Number of listing calls served
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> StoreResult<ObjectPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.read();

        if let Some(err) = &state.listing_error {
            return Err(err.clone());
        }

        let Some(objects) = state.buckets.get(bucket) else {
            return Ok(ObjectPage::default());
        };

        let lower = match &continuation_token {
            Some(token) => Bound::Excluded(token.clone()),
            None => Bound::Unbounded,
        };

        let mut remaining = objects.range((lower, Bound::Unbounded));
        let page: Vec<RemoteObject> = remaining
            .by_ref()
            .take(self.page_size)
            .map(|(key, object)| RemoteObject {
                key: key.clone(),
                etag: object.etag.clone(),
            })
            .collect();

        let next_token = match (remaining.next(), page.last()) {
            (Some(_), Some(last)) => Some(last.key.clone()),
            _ => None,
        };

        Ok(ObjectPage {
            objects: page,
            next_token,
        })
    }

    async fn upload(&self, request: &UploadRequest) -> StoreResult<()> {
        self.write().uploads.push(request.clone());

        let failing = self.read().failing_keys.contains(&request.key);
        if failing {
            return Err(StoreError::AccessDenied(format!(
                "PutObject {}/{}",
                request.bucket, request.key
            )));
        }

        let path = request.local_path.clone();
        let chunk_size = request.chunk_size;
        let (fingerprint, size) = tokio::task::spawn_blocking(move || {
            let size = std::fs::metadata(&path)?.len();
            let fingerprint = Fingerprint::from_file_with_chunk_size(&path, chunk_size)?;
            Ok::<_, std::io::Error>((fingerprint, size))
        })
        .await
        .map_err(|e| StoreError::Io(format!("upload task failed: {}", e)))??;

        self.write()
            .buckets
            .entry(request.bucket.clone())
            .or_default()
            .insert(
                request.key.clone(),
                StoredObject {
                    etag: fingerprint.store_etag(),
                    content_type: Some(request.content_type.clone()),
                    size,
                },
            );
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_pagination_tokens() {
        let store = MemoryStore::new().with_page_size(2);
        for key in ["a", "b", "c"] {
            store.insert_object("site", key, "\"x\"");
        }

        let first = store.list_objects("site", None).await.unwrap();
        assert_eq!(first.objects.len(), 2);
        assert_eq!(first.next_token.as_deref(), Some("b"));

        let second = store.list_objects("site", first.next_token).await.unwrap();
        assert_eq!(second.objects.len(), 1);
        assert_eq!(second.objects[0].key, "c");
        assert!(second.next_token.is_none());
    }

    #[tokio::test]
    async fn test_unknown_bucket_lists_empty() {
        let store = MemoryStore::new();
        let page = store.list_objects("missing", None).await.unwrap();
        assert!(page.objects.is_empty());
        assert!(page.next_token.is_none());
    }

    #[tokio::test]
    async fn test_upload_assigns_store_etag() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hello.txt");
        fs::write(&path, b"hello").unwrap();

        let store = MemoryStore::new();
        let request = UploadRequest {
            bucket: "site".to_string(),
            key: "hello.txt".to_string(),
            local_path: path,
            content_type: "text/plain".to_string(),
            chunk_size: 4,
        };
        store.upload(&request).await.unwrap();

        let object = store.object("site", "hello.txt").unwrap();
        assert!(object.etag.ends_with("-2\""));
        assert_eq!(object.size, 5);
        assert_eq!(object.content_type.as_deref(), Some("text/plain"));
        assert_eq!(store.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_upload_is_recorded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("x.txt");
        fs::write(&path, b"x").unwrap();

        let store = MemoryStore::new();
        store.fail_uploads_for("x.txt");
        let request = UploadRequest {
            bucket: "site".to_string(),
            key: "x.txt".to_string(),
            local_path: path,
            content_type: "text/plain".to_string(),
            chunk_size: 4,
        };

        let err = store.upload(&request).await.unwrap_err();
        assert!(matches!(err, StoreError::AccessDenied(_)));
        assert_eq!(store.upload_count(), 1);
        assert!(store.object("site", "x.txt").is_none());
    }
}
