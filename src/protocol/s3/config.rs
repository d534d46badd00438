//! Configuration types for the S3 store

use crate::protocol::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Default request timeout (5 minutes; multipart parts are large)
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// S3 client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Config {
    /// AWS region (e.g., "us-east-1"); provider chain when unset
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint URL (for S3-compatible services like MinIO)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// AWS access key ID (optional - uses credential chain if not provided)
    #[serde(default)]
    pub access_key: Option<String>,

    /// AWS secret access key (optional - uses credential chain if not provided)
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Session token (for temporary credentials)
    #[serde(default)]
    pub session_token: Option<String>,

    /// AWS profile name to use
    #[serde(default)]
    pub aws_profile: Option<String>,

    /// Path-style addressing (required for some S3-compatible services)
    #[serde(default)]
    pub force_path_style: bool,

    /// Per-operation timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            access_key: None,
            secret_key: None,
            session_token: None,
            aws_profile: None,
            force_path_style: false,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl S3Config {
    /// Validate the configuration
    pub fn validate(&self) -> StoreResult<()> {
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(StoreError::InvalidConfig(
                "Both access_key and secret_key must be provided together".to_string(),
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(StoreError::InvalidConfig(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Check a bucket name against the S3 naming rules
pub fn is_valid_bucket_name(name: &str) -> bool {
    if !(3..=63).contains(&name.len()) {
        return false;
    }

    let bytes = name.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !edge_ok(bytes[0]) || !edge_ok(bytes[bytes.len() - 1]) {
        return false;
    }

    if !bytes
        .iter()
        .all(|&b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return false;
    }

    if name.contains("..") {
        return false;
    }

    // Cannot be formatted as IP address
    if name.split('.').count() == 4 && name.split('.').all(|s| s.parse::<u8>().is_ok()) {
        return false;
    }

    !name.starts_with("xn--") && !name.ends_with("-s3alias")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_bucket_names() {
        assert!(is_valid_bucket_name("my-bucket"));
        assert!(is_valid_bucket_name("www.example.com"));
        assert!(is_valid_bucket_name("abc"));
        assert!(is_valid_bucket_name("a".repeat(63).as_str()));
    }

    #[test]
    fn test_invalid_bucket_names() {
        assert!(!is_valid_bucket_name("ab"));
        assert!(!is_valid_bucket_name(&"a".repeat(64)));
        assert!(!is_valid_bucket_name("My-Bucket"));
        assert!(!is_valid_bucket_name("my_bucket"));
        assert!(!is_valid_bucket_name("my..bucket"));
        assert!(!is_valid_bucket_name("192.168.1.1"));
        assert!(!is_valid_bucket_name("xn--bucket"));
        assert!(!is_valid_bucket_name("bucket-s3alias"));
        assert!(!is_valid_bucket_name("-bucket"));
        assert!(!is_valid_bucket_name("bucket-"));
    }

    #[test]
    fn test_credentials_consistency() {
        let mut config = S3Config {
            access_key: Some("key".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.secret_key = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = S3Config {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: S3Config =
            toml::from_str("region = \"eu-west-1\"\nforce_path_style = true").unwrap();
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert!(config.force_path_style);
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }
}
