//! GetVolume operation for RenderingControl service

use xmltree::Element;

use super::{channel_payload, MASTER_CHANNEL};
use crate::operation::child_number;
use crate::operations::DEFAULT_INSTANCE_ID;
use crate::{ApiError, Service, SonosOperation};

/// GetVolume operation
pub struct GetVolumeOperation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetVolumeRequest {
    pub instance_id: u32,
    pub channel: String,
}

impl GetVolumeRequest {
    pub fn master() -> Self {
        Self {
            instance_id: DEFAULT_INSTANCE_ID,
            channel: MASTER_CHANNEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetVolumeResponse {
    /// Volume on the device's native scale (0-100 on Sonos)
    pub current_volume: u16,
}

impl SonosOperation for GetVolumeOperation {
    type Request = GetVolumeRequest;
    type Response = GetVolumeResponse;

    const SERVICE: Service = Service::RenderingControl;
    const ACTION: &'static str = "GetVolume";

    fn build_payload(request: &Self::Request) -> String {
        channel_payload(request.instance_id, &request.channel)
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(GetVolumeResponse {
            current_volume: child_number(xml, "CurrentVolume")?,
        })
    }
}
