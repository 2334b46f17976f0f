//! GetPositionInfo operation for AVTransport service

use xmltree::Element;

use super::{instance_payload, InstanceRequest};
use crate::operation::{child_number, child_text};
use crate::{ApiError, Service, SonosOperation};

/// GetPositionInfo operation
pub struct GetPositionInfoOperation;

/// Current track and position.
///
/// Time values are kept as the device sent them (`H:MM:SS`, or
/// `NOT_IMPLEMENTED` for sources without a timeline). `track_metadata` is an
/// unescaped DIDL-Lite document, or empty when nothing is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetPositionInfoResponse {
    pub track: u32,
    pub track_duration: String,
    pub track_metadata: String,
    pub track_uri: String,
    pub rel_time: String,
}

impl SonosOperation for GetPositionInfoOperation {
    type Request = InstanceRequest;
    type Response = GetPositionInfoResponse;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "GetPositionInfo";

    fn build_payload(request: &Self::Request) -> String {
        instance_payload(request)
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(GetPositionInfoResponse {
            track: child_number(xml, "Track").unwrap_or(0),
            track_duration: child_text(xml, "TrackDuration")?,
            track_metadata: child_text(xml, "TrackMetaData")?,
            track_uri: child_text(xml, "TrackURI")?,
            rel_time: child_text(xml, "RelTime")?,
        })
    }
}
