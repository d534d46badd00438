//! `RemoteStore` implementation for S3

use super::client::S3Client;
use crate::protocol::{
    ObjectPage, RemoteObject, RemoteStore, StoreError, StoreResult, UploadRequest,
};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::debug;

#[async_trait]
impl RemoteStore for S3Client {
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> StoreResult<ObjectPage> {
        let response = self
            .aws_client()
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(StoreError::from)?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|obj| {
                Some(RemoteObject {
                    key: obj.key()?.to_string(),
                    etag: obj.e_tag().unwrap_or_default().to_string(),
                })
            })
            .collect();

        let next_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectPage {
            objects,
            next_token,
        })
    }

    async fn upload(&self, request: &UploadRequest) -> StoreResult<()> {
        let size = tokio::fs::metadata(&request.local_path).await?.len();

        // Multipart only above one chunk so the stored ETag matches the local fingerprint
        if size > request.chunk_size as u64 {
            return self.upload_multipart(request, size).await;
        }

        let data = tokio::fs::read(&request.local_path).await?;
        self.put_bytes(request, Bytes::from(data)).await
    }

    fn store_name(&self) -> &'static str {
        "s3"
    }
}

impl S3Client {
    /// Upload a whole object in one request
    async fn put_bytes(&self, request: &UploadRequest, data: Bytes) -> StoreResult<()> {
        debug!(key = %request.key, size = data.len(), "put_object");

        self.aws_client()
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .content_type(&request.content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(StoreError::from)?;

        Ok(())
    }
}
