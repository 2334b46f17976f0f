//! Error types for the discovery system.

use thiserror::Error;

/// Error type for discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Socket creation, M-SEARCH send or HTTP failures
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed device description XML
    #[error("Parse error: {0}")]
    Parse(String),

    /// The location URL in an SSDP response has no usable host
    #[error("Invalid device location: {0}")]
    InvalidLocation(String),
}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
