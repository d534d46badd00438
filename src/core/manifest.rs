/*!
 * Point-in-time snapshot of remote object ETags
 */

use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{Result, WebinatorError};
use crate::protocol::RemoteStore;

/// Remote key → server-reported ETag, built once per sync run
///
/// Read-only after loading; share it behind an `Arc` when processing files
/// concurrently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: HashMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the full listing of `bucket`, following pagination to the end
    ///
    /// Any listing failure aborts the load; a partial manifest would make
    /// unchanged files look new.
    pub async fn load<S>(store: &S, bucket: &str) -> Result<Self>
    where
        S: RemoteStore + ?Sized,
    {
        let mut manifest = Manifest::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = store
                .list_objects(bucket, token.take())
                .await
                .map_err(|source| WebinatorError::ManifestLoad {
                    bucket: bucket.to_string(),
                    source,
                })?;
            pages += 1;

            debug!(bucket, page = pages, objects = page.objects.len(), "listing page");
            for object in page.objects {
                manifest.entries.insert(object.key, object.etag);
            }

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        info!(
            bucket,
            store = store.store_name(),
            objects = manifest.len(),
            pages,
            "manifest loaded"
        );
        Ok(manifest)
    }

    /// ETag recorded for `key`, or `None` when the key is absent remotely
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MemoryStore, StoreError};

    #[tokio::test]
    async fn test_empty_bucket_gives_empty_manifest() {
        let store = MemoryStore::new();
        let manifest = Manifest::load(&store, "site").await.unwrap();
        assert!(manifest.is_empty());
    }

    #[tokio::test]
    async fn test_follows_every_page() {
        let store = MemoryStore::new().with_page_size(2);
        for i in 0..5 {
            store.insert_object("site", &format!("file{}.txt", i), &format!("\"etag{}\"", i));
        }

        let manifest = Manifest::load(&store, "site").await.unwrap();

        assert_eq!(manifest.len(), 5);
        assert_eq!(manifest.get("file3.txt"), Some("\"etag3\""));
        assert_eq!(store.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let store = MemoryStore::new();
        store.insert_object("site", "index.html", "\"abc\"");
        store.fail_listing(StoreError::AccessDenied("ListObjectsV2".to_string()));

        let err = Manifest::load(&store, "site").await.unwrap_err();
        assert!(matches!(err, WebinatorError::ManifestLoad { .. }));
        assert_eq!(err.exit_code(), crate::error::EXIT_FATAL);
    }

    #[test]
    fn test_absent_key_is_none() {
        let manifest: Manifest = vec![("a.txt".to_string(), String::new())]
            .into_iter()
            .collect();
        // An empty recorded ETag is still distinct from an absent key
        assert_eq!(manifest.get("a.txt"), Some(""));
        assert_eq!(manifest.get("b.txt"), None);
        assert!(manifest.contains("a.txt"));
    }
}
