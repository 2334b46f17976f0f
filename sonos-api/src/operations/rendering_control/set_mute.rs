//! SetMute operation for RenderingControl service

use xmltree::Element;

use super::{channel_payload, MASTER_CHANNEL};
use crate::operations::DEFAULT_INSTANCE_ID;
use crate::{ApiError, Service, SonosOperation};

/// SetMute operation
pub struct SetMuteOperation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMuteRequest {
    pub instance_id: u32,
    pub channel: String,
    pub desired_mute: bool,
}

impl SetMuteRequest {
    pub fn master(desired_mute: bool) -> Self {
        Self {
            instance_id: DEFAULT_INSTANCE_ID,
            channel: MASTER_CHANNEL.to_string(),
            desired_mute,
        }
    }
}

impl SonosOperation for SetMuteOperation {
    type Request = SetMuteRequest;
    type Response = ();

    const SERVICE: Service = Service::RenderingControl;
    const ACTION: &'static str = "SetMute";

    // UPnP booleans go over the wire as 0/1
    fn build_payload(request: &Self::Request) -> String {
        format!(
            "{}<DesiredMute>{}</DesiredMute>",
            channel_payload(request.instance_id, &request.channel),
            u8::from(request.desired_mute)
        )
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(())
    }
}
