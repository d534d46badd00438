//! S3 store for Webinator
//!
//! Implements [`RemoteStore`](crate::protocol::RemoteStore) on top of the
//! official AWS SDK for Rust. Works with AWS S3 and S3-compatible services
//! such as MinIO through a custom endpoint and path-style addressing.
//!
//! Objects up to one chunk are sent with a single `PutObject`; larger files
//! go through a multipart upload whose part size is the request's chunk
//! size, so the ETag S3 assigns equals the local fingerprint.
//!
//! # Example
//!
//! ```no_run
//! use webinator::protocol::s3::{S3Client, S3Config};
//! use webinator::Manifest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = S3Config {
//!         endpoint: Some("http://localhost:9000".to_string()),
//!         region: Some("us-east-1".to_string()),
//!         access_key: Some("minioadmin".to_string()),
//!         secret_key: Some("minioadmin".to_string()),
//!         force_path_style: true,
//!         ..Default::default()
//!     };
//!
//!     let client = S3Client::new(config).await?;
//!     let manifest = Manifest::load(&client, "my-site").await?;
//!     println!("{} objects", manifest.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod multipart;
mod operations;

pub use client::S3Client;
pub use config::{is_valid_bucket_name, S3Config, DEFAULT_TIMEOUT_SECONDS};
