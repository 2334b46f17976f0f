//! One discovery pass: SSDP search, deduplicate, fetch descriptions.

use crate::device::DeviceDescription;
use crate::error::{DiscoveryError, Result};
use crate::ssdp::SsdpClient;
use crate::Device;
use std::collections::HashSet;
use std::time::Duration;

/// Search target advertised by Sonos zone players
pub const ZONE_PLAYER_URN: &str = "urn:schemas-upnp-org:device:ZonePlayer:1";

/// Reusable scanner holding the HTTP client used for description fetches.
///
/// ```no_run
/// use sonos_discovery::Scanner;
/// use std::time::Duration;
///
/// let scanner = Scanner::new(Duration::from_secs(3))?;
/// for device in scanner.scan()? {
///     println!("{} ({}) at {}", device.name, device.model_name, device.ip_address);
/// }
/// # Ok::<(), sonos_discovery::DiscoveryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Scanner {
    timeout: Duration,
    http: reqwest::blocking::Client,
}

impl Scanner {
    /// Create a scanner. `timeout` bounds both the SSDP listen window and
    /// each description fetch.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DiscoveryError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { timeout, http })
    }

    /// Run one pass and return every device that answered.
    ///
    /// Failing to open the socket or send the search fails the pass. A device
    /// whose description cannot be fetched or parsed is skipped.
    pub fn scan(&self) -> Result<Vec<Device>> {
        let ssdp = SsdpClient::new(self.timeout)?;
        let responses = ssdp.search(ZONE_PLAYER_URN)?;

        let mut seen_locations = HashSet::new();
        let mut devices = Vec::new();
        for response in responses {
            if !seen_locations.insert(response.location.clone()) {
                continue;
            }

            match self.describe(&response.location) {
                Ok(device) => devices.push(device),
                Err(e) => {
                    tracing::debug!(location = %response.location, error = %e, "skipping device")
                }
            }
        }

        Ok(devices)
    }

    /// Fetch and parse the description document at `location`.
    pub fn describe(&self, location: &str) -> Result<Device> {
        let xml = self
            .http
            .get(location)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| DiscoveryError::Network(format!("Failed to fetch device description: {e}")))?;

        DeviceDescription::from_xml(&xml)?.into_device(location)
    }
}
