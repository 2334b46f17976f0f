use sonos_api::ApiError;
use sonos_parser::ParseError;
use thiserror::Error;

use crate::duration::FormatError;

/// Errors raised by the driver core
#[derive(Debug, Error)]
pub enum DriverError {
    /// Discovery or eventing transport unreachable; retried on the next tick
    #[error("Transport error: {0}")]
    Transport(String),

    /// One device could not be opened with the required services
    #[error("Failed to connect to {device}: {reason}")]
    DeviceConnection { device: String, reason: String },

    /// A command or query on an open connection failed
    #[error("Protocol call failed: {0}")]
    Protocol(#[from] ApiError),

    #[error("Invalid time value: {0}")]
    Format(#[from] FormatError),

    #[error("Invalid track metadata: {0}")]
    Metadata(#[from] ParseError),

    /// The command exists on the device model but is not supported
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// The device model or driver bus rejected an update
    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DriverError>;
