//! Zone discovery
//!
//! One sweep enumerates every device answering on the network, keeps the
//! zone players, opens a connection to each and groups them by the zone
//! group they report. A zone made of several players (a stereo pair, a home
//! theatre set) comes back as one [`ZoneInfo`] listing each member in the
//! order it was seen.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sonos_discovery::{Device, Scanner};

use crate::connection::{Connector, DeviceConnection};
use crate::error::{DriverError, Result};

/// Source of the devices currently present on the network
pub trait DiscoveryTransport: Send + Sync {
    /// Enumerate devices. Failing here fails the whole sweep.
    fn discover(&self) -> Result<Vec<Device>>;

    fn close(&self) {}
}

/// [`DiscoveryTransport`] running an SSDP search for zone players
#[derive(Debug, Clone)]
pub struct SsdpDiscovery {
    scanner: Scanner,
}

impl SsdpDiscovery {
    /// `timeout` bounds the search window and each description fetch
    pub fn new(timeout: Duration) -> Result<Self> {
        let scanner = Scanner::new(timeout).map_err(|e| DriverError::Transport(e.to_string()))?;
        Ok(Self { scanner })
    }
}

impl DiscoveryTransport for SsdpDiscovery {
    fn discover(&self) -> Result<Vec<Device>> {
        self.scanner
            .scan()
            .map_err(|e| DriverError::Transport(e.to_string()))
    }
}

/// Whether `device` is a Sonos zone player
pub fn is_zone_player(device: &Device) -> bool {
    device.manufacturer.to_ascii_lowercase().contains("sonos")
        && device.device_type.contains("ZonePlayer")
}

/// One player in a zone, with its open connection
#[derive(Clone)]
pub struct ZoneMember {
    pub device: Device,
    pub connection: Arc<dyn DeviceConnection>,
}

impl fmt::Debug for ZoneMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneMember")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

/// A zone found by a sweep. Never has an empty member list.
#[derive(Debug, Clone)]
pub struct ZoneInfo {
    pub id: String,
    pub name: String,
    pub members: Vec<ZoneMember>,
}

impl ZoneInfo {
    /// The member commands are sent to
    pub fn coordinator(&self) -> Option<&ZoneMember> {
        self.members.first()
    }
}

/// Zones keyed by zone id
pub type ZoneMap = BTreeMap<String, ZoneInfo>;

/// Runs sweeps: transport enumeration, filtering, connecting and grouping
pub struct ZoneDiscovery {
    transport: Arc<dyn DiscoveryTransport>,
    connector: Arc<dyn Connector>,
}

impl ZoneDiscovery {
    pub fn new(transport: Arc<dyn DiscoveryTransport>, connector: Arc<dyn Connector>) -> Self {
        Self {
            transport,
            connector,
        }
    }

    /// Run one sweep.
    ///
    /// Only a transport failure fails the sweep. Devices that cannot be
    /// connected to, or that do not report their zone, are skipped.
    pub fn discover(&self) -> Result<ZoneMap> {
        let devices = self.transport.discover()?;
        tracing::debug!(count = devices.len(), "devices answered discovery");

        let mut zones = ZoneMap::new();
        for device in devices.into_iter().filter(is_zone_player) {
            let connection = match self.connector.connect(&device) {
                Ok(connection) => connection,
                Err(e) => {
                    tracing::warn!(device = %device.id, ip = %device.ip_address, error = %e, "failed to connect to zone player");
                    continue;
                }
            };

            let attributes = match connection.get_zone_group_attributes() {
                Ok(attributes) => attributes,
                Err(e) => {
                    tracing::warn!(device = %device.id, error = %e, "failed to read zone group attributes");
                    continue;
                }
            };

            let member = ZoneMember { device, connection };
            zones
                .entry(attributes.current_zone_group_id.clone())
                .or_insert_with(|| ZoneInfo {
                    id: attributes.current_zone_group_id,
                    name: attributes.current_zone_group_name,
                    members: Vec::new(),
                })
                .members
                .push(member);
        }

        Ok(zones)
    }

    pub fn close(&self) {
        self.transport.close();
        self.connector.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{device, FakeConnector, FakeTransport};
    use rstest::rstest;

    #[rstest]
    #[case("Sonos, Inc.", "urn:schemas-upnp-org:device:ZonePlayer:1", true)]
    #[case("SONOS", "urn:schemas-upnp-org:device:ZonePlayer:1", true)]
    #[case("Sonos, Inc.", "urn:schemas-upnp-org:device:MediaRenderer:1", false)]
    #[case("Philips", "urn:schemas-upnp-org:device:ZonePlayer:1", false)]
    fn test_zone_player_filter(#[case] manufacturer: &str, #[case] device_type: &str, #[case] expected: bool) {
        let mut candidate = device("uuid:RINCON_1", "10.0.0.1");
        candidate.manufacturer = manufacturer.to_string();
        candidate.device_type = device_type.to_string();
        assert_eq!(is_zone_player(&candidate), expected);
    }

    #[test]
    fn test_devices_in_one_zone_are_grouped_in_order() {
        let connector = FakeConnector::new()
            .with_zone("uuid:RINCON_L", "RINCON_L:3", "Living Room")
            .with_zone("uuid:RINCON_R", "RINCON_L:3", "Living Room")
            .with_zone("uuid:RINCON_K", "RINCON_K:1", "Kitchen");
        let transport = FakeTransport::new(vec![
            device("uuid:RINCON_L", "10.0.0.1"),
            device("uuid:RINCON_R", "10.0.0.2"),
            device("uuid:RINCON_K", "10.0.0.3"),
        ]);

        let zones = ZoneDiscovery::new(Arc::new(transport), Arc::new(connector))
            .discover()
            .unwrap();

        assert_eq!(zones.len(), 2);
        let living_room = &zones["RINCON_L:3"];
        assert_eq!(living_room.name, "Living Room");
        let members: Vec<_> = living_room.members.iter().map(|m| m.device.id.as_str()).collect();
        assert_eq!(members, ["uuid:RINCON_L", "uuid:RINCON_R"]);
        assert_eq!(
            living_room.coordinator().map(|m| m.device.id.as_str()),
            Some("uuid:RINCON_L")
        );
    }

    #[test]
    fn test_other_devices_are_ignored() {
        let mut bridge = device("uuid:BRIDGE", "10.0.0.9");
        bridge.device_type = "urn:schemas-upnp-org:device:MediaServer:1".to_string();
        let connector = Arc::new(FakeConnector::new().with_zone("uuid:RINCON_1", "RINCON_1", "Den"));
        let transport = FakeTransport::new(vec![bridge, device("uuid:RINCON_1", "10.0.0.1")]);

        let zones = ZoneDiscovery::new(Arc::new(transport), connector.clone())
            .discover()
            .unwrap();

        assert_eq!(zones.len(), 1);
        assert_eq!(connector.connect_attempts(), ["uuid:RINCON_1"]);
    }

    #[test]
    fn test_unreachable_device_does_not_abort_the_sweep() {
        let connector = FakeConnector::new()
            .with_failure("uuid:RINCON_BAD")
            .with_zone("uuid:RINCON_OK", "RINCON_OK", "Office");
        let transport = FakeTransport::new(vec![
            device("uuid:RINCON_BAD", "10.0.0.1"),
            device("uuid:RINCON_OK", "10.0.0.2"),
        ]);

        let zones = ZoneDiscovery::new(Arc::new(transport), Arc::new(connector))
            .discover()
            .unwrap();

        assert_eq!(zones.keys().collect::<Vec<_>>(), ["RINCON_OK"]);
    }

    #[test]
    fn test_transport_failure_fails_the_sweep() {
        let transport = FakeTransport::failing();
        let result = ZoneDiscovery::new(Arc::new(transport), Arc::new(FakeConnector::new())).discover();
        assert!(matches!(result, Err(DriverError::Transport(_))));
    }
}
