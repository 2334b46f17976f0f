//! UPnP zone player discovery
//!
//! Finds devices on the local network with an SSDP M-SEARCH and reads each
//! responder's UPnP device description. Every responder is returned; deciding
//! which devices are worth driving is left to the caller.
//!
//! ```no_run
//! let devices = sonos_discovery::discover(std::time::Duration::from_secs(3))?;
//! for device in devices {
//!     println!("{} by {} at {}:{}", device.model_name, device.manufacturer, device.ip_address, device.port);
//! }
//! # Ok::<(), sonos_discovery::DiscoveryError>(())
//! ```

pub mod device;
mod discovery;
mod error;
mod ssdp;

pub use discovery::{Scanner, ZONE_PLAYER_URN};
pub use error::{DiscoveryError, Result};

use std::time::Duration;

/// A device that answered the search, as described by its own description XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Unique device identifier (UDN), e.g. "uuid:RINCON_000E58A0123456"
    pub id: String,
    /// Friendly name of the device
    pub name: String,
    /// Room name, when the device reports one
    pub room_name: Option<String>,
    /// IP address taken from the description location
    pub ip_address: String,
    /// Port taken from the description location (1400 for Sonos)
    pub port: u16,
    /// Manufacturer, e.g. "Sonos, Inc."
    pub manufacturer: String,
    /// Model name, e.g. "Sonos One"
    pub model_name: String,
    /// UPnP device type URN
    pub device_type: String,
    /// Description URL the device advertised
    pub location: String,
}

/// Run a single discovery pass with the given timeout.
pub fn discover(timeout: Duration) -> Result<Vec<Device>> {
    Scanner::new(timeout)?.scan()
}
