//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during SOAP communication
#[derive(Debug, Error)]
pub enum SoapError {
    /// Network or HTTP communication error
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The device answered with an unexpected HTTP status
    #[error("Unexpected HTTP status {status} for {method}")]
    Status { method: &'static str, status: u16 },

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// SOAP fault returned by the server
    #[error("SOAP fault: error code {0}")]
    Fault(u16),
}
