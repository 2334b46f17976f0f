use soap_client::SoapError;
use thiserror::Error;

/// High-level API errors for Sonos operations
#[derive(Debug, Error)]
pub enum ApiError {
    /// The device could not be reached or the HTTP exchange failed
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The device answered, but not with the expected response shape
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The device rejected the action with a UPnP fault
    #[error("SOAP fault: error code {0}")]
    SoapFault(u16),

    /// An eventing request (SUBSCRIBE, renewal, UNSUBSCRIBE) failed
    #[error("Subscription error: {0}")]
    SubscriptionError(String),
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<SoapError> for ApiError {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Network(msg) => ApiError::NetworkError(msg),
            SoapError::Status { .. } => ApiError::NetworkError(error.to_string()),
            SoapError::Parse(msg) => ApiError::ParseError(msg),
            SoapError::Fault(code) => ApiError::SoapFault(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soap_error_conversion() {
        let api_error: ApiError = SoapError::Network("connection timeout".to_string()).into();
        assert!(matches!(api_error, ApiError::NetworkError(_)));

        let api_error: ApiError = SoapError::Parse("invalid XML".to_string()).into();
        assert!(matches!(api_error, ApiError::ParseError(_)));

        let api_error: ApiError = SoapError::Fault(701).into();
        assert!(matches!(api_error, ApiError::SoapFault(701)));
    }

    #[test]
    fn test_status_error_keeps_status_in_message() {
        let api_error: ApiError = SoapError::Status {
            method: "POST",
            status: 503,
        }
        .into();

        match api_error {
            ApiError::NetworkError(msg) => assert!(msg.contains("503")),
            other => panic!("Expected NetworkError, got {other:?}"),
        }
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ApiError::NetworkError("connection failed".to_string()).to_string(),
            "Network error: connection failed"
        );
        assert_eq!(ApiError::SoapFault(500).to_string(), "SOAP fault: error code 500");
    }
}
