//! GetTransportInfo operation for AVTransport service

use xmltree::Element;

use super::{instance_payload, InstanceRequest};
use crate::operation::child_text;
use crate::{ApiError, Service, SonosOperation};

/// Transport state reported by `GetTransportInfo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportState {
    Playing,
    PausedPlayback,
    Stopped,
    Transitioning,
    /// Any value outside the four above, e.g. `NO_MEDIA_PRESENT`
    Other(String),
}

impl TransportState {
    pub fn from_upnp(value: &str) -> Self {
        match value {
            "PLAYING" => TransportState::Playing,
            "PAUSED_PLAYBACK" => TransportState::PausedPlayback,
            "STOPPED" => TransportState::Stopped,
            "TRANSITIONING" => TransportState::Transitioning,
            other => TransportState::Other(other.to_string()),
        }
    }
}

/// GetTransportInfo operation
pub struct GetTransportInfoOperation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetTransportInfoResponse {
    pub current_transport_state: TransportState,
    pub current_transport_status: String,
    pub current_speed: String,
}

impl SonosOperation for GetTransportInfoOperation {
    type Request = InstanceRequest;
    type Response = GetTransportInfoResponse;

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "GetTransportInfo";

    fn build_payload(request: &Self::Request) -> String {
        instance_payload(request)
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        let state = child_text(xml, "CurrentTransportState")?;

        Ok(GetTransportInfoResponse {
            current_transport_state: TransportState::from_upnp(state.trim()),
            current_transport_status: child_text(xml, "CurrentTransportStatus")
                .unwrap_or_else(|_| "OK".to_string()),
            current_speed: child_text(xml, "CurrentSpeed").unwrap_or_else(|_| "1".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn element(xml: &str) -> Element {
        Element::parse(xml.as_bytes()).unwrap()
    }

    #[rstest]
    #[case("PLAYING", TransportState::Playing)]
    #[case("PAUSED_PLAYBACK", TransportState::PausedPlayback)]
    #[case("STOPPED", TransportState::Stopped)]
    #[case("TRANSITIONING", TransportState::Transitioning)]
    #[case("NO_MEDIA_PRESENT", TransportState::Other("NO_MEDIA_PRESENT".to_string()))]
    fn test_transport_info_states(#[case] raw: &str, #[case] expected: TransportState) {
        let xml = element(&format!(
            "<GetTransportInfoResponse><CurrentTransportState>{raw}</CurrentTransportState><CurrentTransportStatus>OK</CurrentTransportStatus><CurrentSpeed>1</CurrentSpeed></GetTransportInfoResponse>"
        ));

        let response = GetTransportInfoOperation::parse_response(&xml).unwrap();
        assert_eq!(response.current_transport_state, expected);
    }

    #[test]
    fn test_transport_info_defaults_status_and_speed() {
        let xml = element(
            "<GetTransportInfoResponse><CurrentTransportState>STOPPED</CurrentTransportState></GetTransportInfoResponse>",
        );

        let response = GetTransportInfoOperation::parse_response(&xml).unwrap();
        assert_eq!(response.current_transport_status, "OK");
        assert_eq!(response.current_speed, "1");
    }

    #[test]
    fn test_transport_info_missing_state() {
        let xml = element("<GetTransportInfoResponse><CurrentSpeed>1</CurrentSpeed></GetTransportInfoResponse>");

        match GetTransportInfoOperation::parse_response(&xml) {
            Err(ApiError::ParseError(msg)) => assert!(msg.contains("CurrentTransportState")),
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }
}
