//! Stop operation for AVTransport service

use xmltree::Element;

use super::{instance_payload, InstanceRequest};
use crate::{ApiError, Service, SonosOperation};

/// Stop operation
pub struct StopOperation;

impl SonosOperation for StopOperation {
    type Request = InstanceRequest;
    type Response = ();

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "Stop";

    fn build_payload(request: &Self::Request) -> String {
        instance_payload(request)
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(())
    }
}
