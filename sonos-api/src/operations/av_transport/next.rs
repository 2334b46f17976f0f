//! Next operation for AVTransport service

use xmltree::Element;

use super::{instance_payload, InstanceRequest};
use crate::{ApiError, Service, SonosOperation};

/// Skip to the next track in the queue
pub struct NextOperation;

impl SonosOperation for NextOperation {
    type Request = InstanceRequest;
    type Response = ();

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "Next";

    fn build_payload(request: &Self::Request) -> String {
        instance_payload(request)
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(())
    }
}
