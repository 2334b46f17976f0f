//! Previous operation for AVTransport service

use xmltree::Element;

use super::{instance_payload, InstanceRequest};
use crate::{ApiError, Service, SonosOperation};

/// Skip to the previous track in the queue
pub struct PreviousOperation;

impl SonosOperation for PreviousOperation {
    type Request = InstanceRequest;
    type Response = ();

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "Previous";

    fn build_payload(request: &Self::Request) -> String {
        instance_payload(request)
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(())
    }
}
