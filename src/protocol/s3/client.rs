//! S3 client construction

use super::config::S3Config;
use crate::protocol::{StoreError, StoreResult};
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client as AwsS3Client;
use std::time::Duration;

/// Store backed by AWS S3 or an S3-compatible service
#[derive(Clone)]
pub struct S3Client {
    client: AwsS3Client,
}

impl S3Client {
    /// Create a new S3 client with the given configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use webinator::protocol::s3::{S3Client, S3Config};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let config = S3Config {
    ///         region: Some("us-east-1".to_string()),
    ///         ..Default::default()
    ///     };
    ///     let _client = S3Client::new(config).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: S3Config) -> StoreResult<Self> {
        config.validate()?;

        let client = Self::build_aws_client(&config).await;

        Ok(Self { client })
    }

    async fn build_aws_client(config: &S3Config) -> AwsS3Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        let region_provider = match &config.region {
            Some(region) => RegionProviderChain::first_try(Region::new(region.clone())),
            None => RegionProviderChain::default_provider(),
        };
        loader = loader.region(region_provider);

        if let Some(profile) = &config.aws_profile {
            loader = loader.profile_name(profile);
        }

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            let credentials = Credentials::new(
                access_key,
                secret_key,
                config.session_token.clone(),
                None,
                "webinator-explicit",
            );
            loader = loader.credentials_provider(credentials);
        }

        let aws_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&aws_config);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        // MinIO and LocalStack need path-style addressing
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        let timeout_config = aws_sdk_s3::config::timeout::TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.timeout_seconds))
            .build();
        builder = builder.timeout_config(timeout_config);

        AwsS3Client::from_conf(builder.build())
    }

    pub(crate) fn aws_client(&self) -> &AwsS3Client {
        &self.client
    }

    /// Region the bucket actually lives in, from `GetBucketLocation`
    pub async fn bucket_region(&self, bucket: &str) -> StoreResult<String> {
        let response = self
            .client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(StoreError::from)?;

        Ok(location_to_region(response.location_constraint().map(|c| c.as_str())))
    }
}

/// Map a location constraint to a region code
///
/// us-east-1 buckets report no constraint; very old EU buckets report `EU`.
pub(crate) fn location_to_region(constraint: Option<&str>) -> String {
    match constraint {
        None | Some("") => "us-east-1".to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}
