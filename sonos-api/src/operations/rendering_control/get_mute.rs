//! GetMute operation for RenderingControl service

use xmltree::Element;

use super::channel_payload;
use super::get_volume::GetVolumeRequest;
use crate::operation::child_bool;
use crate::{ApiError, Service, SonosOperation};

/// GetMute operation
pub struct GetMuteOperation;

/// Same arguments as `GetVolume`: an instance and a channel
pub type GetMuteRequest = GetVolumeRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetMuteResponse {
    pub current_mute: bool,
}

impl SonosOperation for GetMuteOperation {
    type Request = GetMuteRequest;
    type Response = GetMuteResponse;

    const SERVICE: Service = Service::RenderingControl;
    const ACTION: &'static str = "GetMute";

    fn build_payload(request: &Self::Request) -> String {
        channel_payload(request.instance_id, &request.channel)
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(GetMuteResponse {
            current_mute: child_bool(xml, "CurrentMute")?,
        })
    }
}
