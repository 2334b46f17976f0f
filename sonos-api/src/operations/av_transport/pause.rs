//! Pause operation for AVTransport service

use xmltree::Element;

use super::{instance_payload, InstanceRequest};
use crate::{ApiError, Service, SonosOperation};

/// Pause operation
pub struct PauseOperation;

impl SonosOperation for PauseOperation {
    type Request = InstanceRequest;
    type Response = ();

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "Pause";

    fn build_payload(request: &Self::Request) -> String {
        instance_payload(request)
    }

    fn parse_response(_xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(())
    }
}
