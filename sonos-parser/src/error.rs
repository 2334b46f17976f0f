//! Error types for XML parsing operations

use thiserror::Error;

/// Errors that can occur while decoding metadata XML
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The document is not well-formed or does not fit the target type
    #[error("XML deserialization failed: {0}")]
    Xml(String),

    /// The document parsed but is not the expected kind of document
    #[error("Invalid XML structure: {0}")]
    InvalidStructure(String),
}

/// Result type alias for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;
