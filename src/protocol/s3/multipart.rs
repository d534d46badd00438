//! Multipart upload for files larger than one chunk
//!
//! Parts are read sequentially with exactly `chunk_size` bytes each (the
//! last one shorter), which makes S3 assign the same composite ETag the
//! local fingerprint computes.

use super::client::S3Client;
use crate::protocol::{StoreError, StoreResult, UploadRequest};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

impl S3Client {
    /// Upload `request.local_path` (of `size` bytes) in `chunk_size` parts
    pub(crate) async fn upload_multipart(
        &self,
        request: &UploadRequest,
        size: u64,
    ) -> StoreResult<()> {
        let upload_id = self.initiate_multipart_upload(request).await?;

        match self.upload_parts(request, &upload_id, size).await {
            Ok(parts) => {
                self.complete_multipart_upload(request, &upload_id, parts)
                    .await
            }
            Err(e) => {
                if let Err(abort_err) = self.abort_multipart_upload(request, &upload_id).await {
                    warn!(
                        key = %request.key,
                        error = %abort_err,
                        "failed to abort multipart upload"
                    );
                }
                Err(e.context(format!("multipart upload of {}", request.key)))
            }
        }
    }

    async fn initiate_multipart_upload(&self, request: &UploadRequest) -> StoreResult<String> {
        let response = self
            .aws_client()
            .create_multipart_upload()
            .bucket(&request.bucket)
            .key(&request.key)
            .content_type(&request.content_type)
            .send()
            .await
            .map_err(StoreError::from)?;

        response
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| StoreError::MultipartUpload("No upload ID returned".to_string()))
    }

    async fn upload_parts(
        &self,
        request: &UploadRequest,
        upload_id: &str,
        size: u64,
    ) -> StoreResult<Vec<CompletedPart>> {
        let chunk_size = request.chunk_size.max(1);
        let mut file = File::open(&request.local_path).await?;
        let mut parts = Vec::with_capacity(size.div_ceil(chunk_size as u64) as usize);
        let mut part_number: i32 = 1;

        loop {
            let mut buffer = Vec::with_capacity(chunk_size);
            (&mut file)
                .take(chunk_size as u64)
                .read_to_end(&mut buffer)
                .await?;
            if buffer.is_empty() {
                break;
            }

            let etag = self
                .upload_part(request, upload_id, part_number, Bytes::from(buffer))
                .await?;
            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .e_tag(etag)
                    .build(),
            );
            part_number += 1;
        }

        debug!(key = %request.key, parts = parts.len(), "all parts uploaded");
        Ok(parts)
    }

    async fn upload_part(
        &self,
        request: &UploadRequest,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> StoreResult<String> {
        let response = self
            .aws_client()
            .upload_part()
            .bucket(&request.bucket)
            .key(&request.key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(StoreError::from)?;

        response
            .e_tag()
            .map(str::to_string)
            .ok_or_else(|| StoreError::MultipartUpload("No ETag returned for part".to_string()))
    }

    async fn complete_multipart_upload(
        &self,
        request: &UploadRequest,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> StoreResult<()> {
        let multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        self.aws_client()
            .complete_multipart_upload()
            .bucket(&request.bucket)
            .key(&request.key)
            .upload_id(upload_id)
            .multipart_upload(multipart_upload)
            .send()
            .await
            .map_err(StoreError::from)?;

        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        request: &UploadRequest,
        upload_id: &str,
    ) -> StoreResult<()> {
        self.aws_client()
            .abort_multipart_upload()
            .bucket(&request.bucket)
            .key(&request.key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(StoreError::from)?;

        Ok(())
    }
}
