/// Vendor error type
///
/// Every vendor call resolves to a typed outcome so callers decide on
/// retries from the variant, never from message text.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VendorError {
    /// Rate limiting, 5xx, timeouts and connection failures
    #[error("{vendor} is temporarily unavailable: {message}")]
    Transient { vendor: &'static str, message: String },

    /// Non-retryable HTTP error
    #[error("{vendor} returned HTTP {status}: {body}")]
    Permanent {
        vendor: &'static str,
        status: u16,
        body: String,
    },

    /// Enrollment photo contains no detectable face
    #[error("No face detected in the image")]
    NoFaceDetected,

    /// The vendor answered 2xx but refused the operation
    #[error("{vendor} rejected the request: {message}")]
    Rejected { vendor: &'static str, message: String },

    /// Response body did not have the expected shape
    #[error("Unexpected {vendor} response: {message}")]
    Decode { vendor: &'static str, message: String },

    /// Credentials for this vendor are missing
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Vendor result type alias
pub type VendorResult<T> = Result<T, VendorError>;

/// Strategy for handling errors in a retry context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRetryStrategy {
    /// Retry with exponential backoff
    Retry,
    /// Failed permanently
    Fail,
}

impl VendorError {
    /// Classifies a non-success HTTP status
    pub fn from_status(vendor: &'static str, status: StatusCode, body: String) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            VendorError::Transient {
                vendor,
                message: format!("HTTP {}: {}", status.as_u16(), body),
            }
        } else {
            VendorError::Permanent {
                vendor,
                status: status.as_u16(),
                body,
            }
        }
    }

    /// Classifies a reqwest failure
    pub fn from_reqwest(vendor: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            return VendorError::Transient {
                vendor,
                message: err.to_string(),
            };
        }

        if let Some(status) = err.status() {
            return VendorError::from_status(vendor, status, err.to_string());
        }

        if err.is_decode() {
            return VendorError::Decode {
                vendor,
                message: err.to_string(),
            };
        }

        VendorError::Transient {
            vendor,
            message: err.to_string(),
        }
    }

    pub fn decode(vendor: &'static str, message: impl Into<String>) -> Self {
        VendorError::Decode {
            vendor,
            message: message.into(),
        }
    }

    /// Determine retry strategy based upon the error
    pub fn to_retry_strategy(&self) -> ErrorRetryStrategy {
        match self {
            VendorError::Transient { .. } => ErrorRetryStrategy::Retry,
            VendorError::Permanent { .. }
            | VendorError::NoFaceDetected
            | VendorError::Rejected { .. }
            | VendorError::Decode { .. }
            | VendorError::NotConfigured(_) => ErrorRetryStrategy::Fail,
        }
    }
}

/// Reads a response, mapping non-success statuses to [`VendorError`]
pub(crate) async fn check_status(
    vendor: &'static str,
    response: reqwest::Response,
) -> VendorResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(VendorError::from_status(vendor, status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let err = VendorError::from_status("luxand", StatusCode::SERVICE_UNAVAILABLE, "busy".into());
        assert_eq!(err.to_retry_strategy(), ErrorRetryStrategy::Retry);

        let err = VendorError::from_status("luxand", StatusCode::TOO_MANY_REQUESTS, String::new());
        assert_eq!(err.to_retry_strategy(), ErrorRetryStrategy::Retry);

        let err = VendorError::from_status("luxand", StatusCode::BAD_REQUEST, "bad photo".into());
        assert_eq!(err.to_retry_strategy(), ErrorRetryStrategy::Fail);
        assert!(matches!(err, VendorError::Permanent { status: 400, .. }));
    }

    #[test]
    fn test_domain_failures_are_not_retried() {
        assert_eq!(VendorError::NoFaceDetected.to_retry_strategy(), ErrorRetryStrategy::Fail);
        assert_eq!(
            VendorError::NotConfigured("stripe").to_retry_strategy(),
            ErrorRetryStrategy::Fail
        );
    }
}
