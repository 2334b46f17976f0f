//! Connections to individual zone players

use std::sync::Arc;

use sonos_api::operations::av_transport::{
    GetPositionInfoOperation, GetPositionInfoResponse, GetTransportInfoOperation,
    GetTransportInfoResponse, InstanceRequest, NextOperation, PauseOperation, PlayOperation,
    PlayRequest, PreviousOperation, StopOperation,
};
use sonos_api::operations::rendering_control::{
    GetMuteOperation, GetVolumeOperation, GetVolumeRequest, SetMuteOperation, SetMuteRequest,
    SetVolumeOperation, SetVolumeRequest,
};
use sonos_api::operations::zone_group_topology::{
    GetZoneGroupAttributesOperation, GetZoneGroupAttributesResponse,
};
use sonos_api::SonosClient;
use sonos_discovery::Device;

use crate::error::Result;

/// An open session to one physical zone player
pub trait DeviceConnection: Send + Sync {
    fn play(&self, instance_id: u32, speed: &str) -> sonos_api::Result<()>;
    fn pause(&self, instance_id: u32) -> sonos_api::Result<()>;
    fn stop(&self, instance_id: u32) -> sonos_api::Result<()>;
    fn next(&self, instance_id: u32) -> sonos_api::Result<()>;
    fn previous(&self, instance_id: u32) -> sonos_api::Result<()>;

    /// Volume on the device's native scale
    fn get_volume(&self, instance_id: u32, channel: &str) -> sonos_api::Result<u16>;
    fn set_volume(&self, instance_id: u32, channel: &str, volume: u16) -> sonos_api::Result<()>;
    fn get_mute(&self, instance_id: u32, channel: &str) -> sonos_api::Result<bool>;
    fn set_mute(&self, instance_id: u32, channel: &str, muted: bool) -> sonos_api::Result<()>;

    fn get_transport_info(&self, instance_id: u32) -> sonos_api::Result<GetTransportInfoResponse>;
    fn get_position_info(&self, instance_id: u32) -> sonos_api::Result<GetPositionInfoResponse>;
    fn get_zone_group_attributes(&self) -> sonos_api::Result<GetZoneGroupAttributesResponse>;
}

/// Opens connections covering rendering control, transport control, zone
/// topology and content directory
pub trait Connector: Send + Sync {
    fn connect(&self, device: &Device) -> Result<Arc<dyn DeviceConnection>>;

    /// Release whatever the connector holds on behalf of its connections
    fn close(&self) {}
}

/// [`DeviceConnection`] issuing SOAP calls through [`SonosClient`]
#[derive(Debug, Clone)]
pub struct SonosConnection {
    client: SonosClient,
    ip: String,
    port: u16,
}

impl SonosConnection {
    pub fn new(client: SonosClient, ip: impl Into<String>, port: u16) -> Self {
        Self {
            client,
            ip: ip.into(),
            port,
        }
    }

    pub fn for_device(client: SonosClient, device: &Device) -> Self {
        Self::new(client, device.ip_address.clone(), device.port)
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn instance(instance_id: u32) -> InstanceRequest {
        InstanceRequest { instance_id }
    }

    fn channel(instance_id: u32, channel: &str) -> GetVolumeRequest {
        GetVolumeRequest {
            instance_id,
            channel: channel.to_string(),
        }
    }
}

impl DeviceConnection for SonosConnection {
    fn play(&self, instance_id: u32, speed: &str) -> sonos_api::Result<()> {
        let request = PlayRequest {
            instance_id,
            speed: speed.to_string(),
        };
        self.client.execute::<PlayOperation>(&self.ip, self.port, &request)
    }

    fn pause(&self, instance_id: u32) -> sonos_api::Result<()> {
        self.client
            .execute::<PauseOperation>(&self.ip, self.port, &Self::instance(instance_id))
    }

    fn stop(&self, instance_id: u32) -> sonos_api::Result<()> {
        self.client
            .execute::<StopOperation>(&self.ip, self.port, &Self::instance(instance_id))
    }

    fn next(&self, instance_id: u32) -> sonos_api::Result<()> {
        self.client
            .execute::<NextOperation>(&self.ip, self.port, &Self::instance(instance_id))
    }

    fn previous(&self, instance_id: u32) -> sonos_api::Result<()> {
        self.client
            .execute::<PreviousOperation>(&self.ip, self.port, &Self::instance(instance_id))
    }

    fn get_volume(&self, instance_id: u32, channel: &str) -> sonos_api::Result<u16> {
        self.client
            .execute::<GetVolumeOperation>(&self.ip, self.port, &Self::channel(instance_id, channel))
            .map(|response| response.current_volume)
    }

    fn set_volume(&self, instance_id: u32, channel: &str, volume: u16) -> sonos_api::Result<()> {
        let request = SetVolumeRequest {
            instance_id,
            channel: channel.to_string(),
            desired_volume: volume,
        };
        self.client
            .execute::<SetVolumeOperation>(&self.ip, self.port, &request)
    }

    fn get_mute(&self, instance_id: u32, channel: &str) -> sonos_api::Result<bool> {
        self.client
            .execute::<GetMuteOperation>(&self.ip, self.port, &Self::channel(instance_id, channel))
            .map(|response| response.current_mute)
    }

    fn set_mute(&self, instance_id: u32, channel: &str, muted: bool) -> sonos_api::Result<()> {
        let request = SetMuteRequest {
            instance_id,
            channel: channel.to_string(),
            desired_mute: muted,
        };
        self.client.execute::<SetMuteOperation>(&self.ip, self.port, &request)
    }

    fn get_transport_info(&self, instance_id: u32) -> sonos_api::Result<GetTransportInfoResponse> {
        self.client
            .execute::<GetTransportInfoOperation>(&self.ip, self.port, &Self::instance(instance_id))
    }

    fn get_position_info(&self, instance_id: u32) -> sonos_api::Result<GetPositionInfoResponse> {
        self.client
            .execute::<GetPositionInfoOperation>(&self.ip, self.port, &Self::instance(instance_id))
    }

    fn get_zone_group_attributes(&self) -> sonos_api::Result<GetZoneGroupAttributesResponse> {
        self.client
            .execute::<GetZoneGroupAttributesOperation>(&self.ip, self.port, &())
    }
}
