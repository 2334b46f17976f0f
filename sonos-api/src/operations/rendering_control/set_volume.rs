//! SetVolume operation for RenderingControl service

use xmltree::Element;

use super::{channel_payload, MASTER_CHANNEL};
use crate::operations::DEFAULT_INSTANCE_ID;
use crate::{ApiError, Service, SonosOperation};

/// SetVolume operation
pub struct SetVolumeOperation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetVolumeRequest {
    pub instance_id: u32,
    pub channel: String,
    pub desired_volume: u16,
}

impl SetVolumeRequest {
    pub fn master(desired_volume: u16) -> Self {
        Self {
            instance_id: DEFAULT_INSTANCE_ID,
            channel: MASTER_CHANNEL.to_string(),
            desired_volume,
        }
    }
}

impl SonosOperation for SetVolumeOperation {
    type Request = SetVolumeRequest;
    type Response = ();

    const SERVICE: Service = Service::RenderingControl;
    const ACTION: &'static str = "SetVolume";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "{}<DesiredVolume>{}</DesiredVolume>",
            channel_payload(request.instance_id, &request.channel),
            request.desired_volume
        )
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_volume_payload() {
        assert_eq!(
            SetVolumeOperation::build_payload(&SetVolumeRequest::master(80)),
            "<InstanceID>0</InstanceID><Channel>Master</Channel><DesiredVolume>80</DesiredVolume>"
        );
    }

    #[test]
    fn test_set_volume_response_parsing() {
        let xml = Element::parse("<SetVolumeResponse/>".as_bytes()).unwrap();
        assert!(SetVolumeOperation::parse_response(&xml).is_ok());
    }
}
