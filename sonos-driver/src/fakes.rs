//! In-memory collaborators for unit tests

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sonos_api::operations::av_transport::{
    GetPositionInfoResponse, GetTransportInfoResponse, TransportState,
};
use sonos_api::operations::zone_group_topology::GetZoneGroupAttributesResponse;
use sonos_api::ApiError;
use sonos_discovery::Device;

use crate::bus::{CommandBinding, DriverBus, MediaPlayerCommands, MediaPlayerDevice, PlayerCommand};
use crate::connection::{Connector, DeviceConnection};
use crate::discovery::DiscoveryTransport;
use crate::error::{DriverError, Result};
use crate::model::{AnnouncedDevice, ControlState, DriverInfo, MusicTrack, VolumeState};

pub fn device(id: &str, ip: &str) -> Device {
    Device {
        id: id.to_string(),
        name: format!("{ip} - Sonos One"),
        room_name: None,
        ip_address: ip.to_string(),
        port: 1400,
        manufacturer: "Sonos, Inc.".to_string(),
        model_name: "Sonos One".to_string(),
        device_type: "urn:schemas-upnp-org:device:ZonePlayer:1".to_string(),
        location: format!("http://{ip}:1400/xml/device_description.xml"),
    }
}

/// What a [`FakeConnection`] reports when queried
#[derive(Debug, Clone)]
pub struct DeviceState {
    pub transport_state: String,
    pub volume: u16,
    pub muted: bool,
    pub track_uri: String,
    pub track_duration: String,
    pub rel_time: String,
    pub track_metadata: String,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            transport_state: "STOPPED".to_string(),
            volume: 50,
            muted: false,
            track_uri: String::new(),
            track_duration: String::new(),
            rel_time: String::new(),
            track_metadata: String::new(),
        }
    }
}

pub struct FakeConnection {
    zone_id: String,
    zone_name: String,
    pub state: Mutex<DeviceState>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl FakeConnection {
    pub fn new(zone_id: &str, zone_name: &str) -> Self {
        Self {
            zone_id: zone_id.to_string(),
            zone_name: zone_name.to_string(),
            state: Mutex::new(DeviceState::default()),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make every call to `method` fail from now on
    pub fn fail(&self, method: &'static str) {
        self.failing.lock().insert(method);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, method: &'static str, call: String) -> sonos_api::Result<()> {
        self.calls.lock().push(call);
        if self.failing.lock().contains(method) {
            Err(ApiError::NetworkError(format!("{method} failed")))
        } else {
            Ok(())
        }
    }
}

impl DeviceConnection for FakeConnection {
    fn play(&self, instance_id: u32, speed: &str) -> sonos_api::Result<()> {
        self.record("play", format!("play:{instance_id}:{speed}"))
    }

    fn pause(&self, _instance_id: u32) -> sonos_api::Result<()> {
        self.record("pause", "pause".to_string())
    }

    fn stop(&self, _instance_id: u32) -> sonos_api::Result<()> {
        self.record("stop", "stop".to_string())
    }

    fn next(&self, _instance_id: u32) -> sonos_api::Result<()> {
        self.record("next", "next".to_string())
    }

    fn previous(&self, _instance_id: u32) -> sonos_api::Result<()> {
        self.record("previous", "previous".to_string())
    }

    fn get_volume(&self, _instance_id: u32, _channel: &str) -> sonos_api::Result<u16> {
        self.record("get_volume", "get_volume".to_string())?;
        Ok(self.state.lock().volume)
    }

    fn set_volume(&self, _instance_id: u32, channel: &str, volume: u16) -> sonos_api::Result<()> {
        self.record("set_volume", format!("set_volume:{channel}:{volume}"))?;
        self.state.lock().volume = volume;
        Ok(())
    }

    fn get_mute(&self, _instance_id: u32, _channel: &str) -> sonos_api::Result<bool> {
        self.record("get_mute", "get_mute".to_string())?;
        Ok(self.state.lock().muted)
    }

    fn set_mute(&self, _instance_id: u32, channel: &str, muted: bool) -> sonos_api::Result<()> {
        self.record("set_mute", format!("set_mute:{channel}:{muted}"))?;
        self.state.lock().muted = muted;
        Ok(())
    }

    fn get_transport_info(&self, _instance_id: u32) -> sonos_api::Result<GetTransportInfoResponse> {
        self.record("get_transport_info", "get_transport_info".to_string())?;
        Ok(GetTransportInfoResponse {
            current_transport_state: TransportState::from_upnp(&self.state.lock().transport_state),
            current_transport_status: "OK".to_string(),
            current_speed: "1".to_string(),
        })
    }

    fn get_position_info(&self, _instance_id: u32) -> sonos_api::Result<GetPositionInfoResponse> {
        self.record("get_position_info", "get_position_info".to_string())?;
        let state = self.state.lock();
        Ok(GetPositionInfoResponse {
            track: 1,
            track_duration: state.track_duration.clone(),
            track_metadata: state.track_metadata.clone(),
            track_uri: state.track_uri.clone(),
            rel_time: state.rel_time.clone(),
        })
    }

    fn get_zone_group_attributes(&self) -> sonos_api::Result<GetZoneGroupAttributesResponse> {
        self.record("get_zone_group_attributes", "get_zone_group_attributes".to_string())?;
        Ok(GetZoneGroupAttributesResponse {
            current_zone_group_name: self.zone_name.clone(),
            current_zone_group_id: self.zone_id.clone(),
            current_zone_player_uuids_in_group: String::new(),
        })
    }
}

#[derive(Default)]
pub struct FakeConnector {
    connections: HashMap<String, Arc<FakeConnection>>,
    failing: HashSet<String>,
    attempts: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(mut self, device_id: &str, zone_id: &str, zone_name: &str) -> Self {
        self.connections.insert(
            device_id.to_string(),
            Arc::new(FakeConnection::new(zone_id, zone_name)),
        );
        self
    }

    pub fn with_failure(mut self, device_id: &str) -> Self {
        self.failing.insert(device_id.to_string());
        self
    }

    pub fn connection(&self, device_id: &str) -> Arc<FakeConnection> {
        self.connections[device_id].clone()
    }

    pub fn connect_attempts(&self) -> Vec<String> {
        self.attempts.lock().clone()
    }
}

impl Connector for FakeConnector {
    fn connect(&self, device: &Device) -> Result<Arc<dyn DeviceConnection>> {
        self.attempts.lock().push(device.id.clone());
        if self.failing.contains(&device.id) {
            return Err(DriverError::DeviceConnection {
                device: device.id.clone(),
                reason: "connection refused".to_string(),
            });
        }

        match self.connections.get(&device.id) {
            Some(connection) => Ok(connection.clone()),
            None => Err(DriverError::DeviceConnection {
                device: device.id.clone(),
                reason: "unknown device".to_string(),
            }),
        }
    }
}

pub struct FakeTransport {
    devices: Mutex<Option<Vec<Device>>>,
}

impl FakeTransport {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: Mutex::new(Some(devices)),
        }
    }

    pub fn failing() -> Self {
        Self {
            devices: Mutex::new(None),
        }
    }

    /// Fail every sweep from now on
    pub fn fail(&self) {
        *self.devices.lock() = None;
    }
}

impl DiscoveryTransport for FakeTransport {
    fn discover(&self) -> Result<Vec<Device>> {
        self.devices
            .lock()
            .clone()
            .ok_or_else(|| DriverError::Transport("network unreachable".to_string()))
    }
}

/// Everything a device model received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    Control(ControlState),
    Volume(VolumeState),
    Media(Option<MusicTrack>, Option<u64>),
}

#[derive(Default)]
pub struct RecordingDevice {
    published: Mutex<Vec<Published>>,
    commands: CommandBinding,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().clone()
    }

    pub fn clear(&self) {
        self.published.lock().clear();
    }

    /// Hand `command` to the bound player, as a bus client would
    pub fn deliver(&self, command: PlayerCommand) -> Result<()> {
        self.commands.dispatch(&command)
    }
}

impl MediaPlayerDevice for RecordingDevice {
    fn update_control_state(&self, state: ControlState) -> Result<()> {
        self.published.lock().push(Published::Control(state));
        Ok(())
    }

    fn update_volume_state(&self, state: &VolumeState) -> Result<()> {
        self.published.lock().push(Published::Volume(*state));
        Ok(())
    }

    fn update_music_media_state(&self, track: Option<&MusicTrack>, position_ms: Option<u64>) -> Result<()> {
        self.published
            .lock()
            .push(Published::Media(track.cloned(), position_ms));
        Ok(())
    }

    fn bind_commands(&self, commands: Weak<dyn MediaPlayerCommands>) {
        self.commands.bind(commands);
    }
}

#[derive(Default)]
pub struct RecordingBus {
    pub devices: Mutex<Vec<(AnnouncedDevice, Arc<RecordingDevice>)>>,
    pub drivers: Mutex<Vec<DriverInfo>>,
    rejected: HashSet<String>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(mut self, zone_id: &str) -> Self {
        self.rejected.insert(zone_id.to_string());
        self
    }

    pub fn device(&self, zone_id: &str) -> Option<Arc<RecordingDevice>> {
        self.devices
            .lock()
            .iter()
            .find(|(announced, _)| announced.natural_id == zone_id)
            .map(|(_, device)| device.clone())
    }
}

impl DriverBus for RecordingBus {
    fn announce_driver(&self, info: &DriverInfo) -> Result<()> {
        self.drivers.lock().push(info.clone());
        Ok(())
    }

    fn export_driver(&self, _info: &DriverInfo) -> Result<()> {
        Ok(())
    }

    fn announce_device(&self, device: AnnouncedDevice) -> Result<Arc<dyn MediaPlayerDevice>> {
        if self.rejected.contains(&device.natural_id) {
            return Err(DriverError::Bus(format!("{} rejected", device.natural_id)));
        }

        let recorder = Arc::new(RecordingDevice::new());
        self.devices.lock().push((device, recorder.clone()));
        Ok(recorder)
    }
}
