//! UPnP device description parsing.

use crate::error::{DiscoveryError, Result};
use crate::Device;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Root {
    device: DeviceDescription,
}

/// The subset of a UPnP device description the driver uses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescription {
    pub device_type: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub model_name: String,
    #[serde(rename = "UDN")]
    pub udn: String,
    pub room_name: Option<String>,
}

impl DeviceDescription {
    /// Parse a device description document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root: Root = quick_xml::de::from_str(xml)
            .map_err(|e| DiscoveryError::Parse(format!("Failed to parse device XML: {e}")))?;
        Ok(root.device)
    }

    /// Combine the description with the address it was fetched from.
    pub fn into_device(self, location: &str) -> Result<Device> {
        let (ip_address, port) = parse_location(location)
            .ok_or_else(|| DiscoveryError::InvalidLocation(location.to_string()))?;

        Ok(Device {
            id: self.udn,
            name: self.friendly_name,
            room_name: self.room_name,
            ip_address,
            port,
            manufacturer: self.manufacturer,
            model_name: self.model_name,
            device_type: self.device_type,
            location: location.to_string(),
        })
    }
}

/// Host and port of a description URL such as
/// `http://192.168.1.100:1400/xml/device_description.xml`.
///
/// The port defaults to 80 when the URL does not carry one.
pub fn parse_location(url: &str) -> Option<(String, u16)> {
    let rest = url.split_once("://")?.1;
    let authority = rest.split('/').next()?;
    if authority.is_empty() {
        return None;
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => Some((host.to_string(), port.parse().ok()?)),
        None => Some((authority.to_string(), 80)),
    }
}
