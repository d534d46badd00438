//! Conversion of AWS SDK errors into store errors

use crate::protocol::StoreError;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};

impl<E> From<SdkError<E>> for StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    fn from(error: SdkError<E>) -> Self {
        match error {
            SdkError::TimeoutError(e) => StoreError::Timeout(format!("{:?}", e)),
            SdkError::DispatchFailure(e) => {
                if e.is_timeout() {
                    StoreError::Timeout(format!("Dispatch timed out: {:?}", e))
                } else {
                    StoreError::Network(format!("Network dispatch failure: {:?}", e))
                }
            }
            SdkError::ResponseError(e) => {
                StoreError::Network(format!("Response error: {:?}", e))
            }
            SdkError::ServiceError(e) => from_service_error(e.err()),
            other => StoreError::Sdk(format!("{:?}", other)),
        }
    }
}

fn from_service_error<E>(err: &E) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());

    match err.code() {
        Some("NoSuchBucket") => StoreError::BucketNotFound(message),
        Some("AccessDenied") | Some("InvalidAccessKeyId") | Some("SignatureDoesNotMatch") => {
            StoreError::AccessDenied(message)
        }
        Some("QuotaExceeded") => StoreError::QuotaExceeded(message),
        Some(code) => StoreError::Service {
            code: code.to_string(),
            message,
        },
        None => StoreError::Service {
            code: "Unknown".to_string(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::error::ErrorMetadata;
    use std::fmt;

    #[derive(Debug)]
    struct FakeServiceError(ErrorMetadata);

    impl fmt::Display for FakeServiceError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fake service error")
        }
    }

    impl std::error::Error for FakeServiceError {}

    impl ProvideErrorMetadata for FakeServiceError {
        fn meta(&self) -> &ErrorMetadata {
            &self.0
        }
    }

    fn fake(code: &str, message: &str) -> FakeServiceError {
        FakeServiceError(ErrorMetadata::builder().code(code).message(message).build())
    }

    #[test]
    fn test_bucket_not_found() {
        let err = from_service_error(&fake("NoSuchBucket", "gone"));
        assert!(matches!(err, StoreError::BucketNotFound(ref m) if m == "gone"));
    }

    #[test]
    fn test_access_denied() {
        let err = from_service_error(&fake("AccessDenied", "nope"));
        assert!(matches!(err, StoreError::AccessDenied(_)));
    }

    #[test]
    fn test_other_service_code_kept() {
        let err = from_service_error(&fake("SlowDown", "reduce your request rate"));
        assert!(matches!(err, StoreError::Service { ref code, .. } if code == "SlowDown"));
        assert_eq!(
            err.to_string(),
            "Store service error (SlowDown): reduce your request rate"
        );
    }

    #[test]
    fn test_missing_code() {
        let err = from_service_error(&FakeServiceError(ErrorMetadata::builder().build()));
        match err {
            StoreError::Service { code, message } => {
                assert_eq!(code, "Unknown");
                assert_eq!(message, "fake service error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
