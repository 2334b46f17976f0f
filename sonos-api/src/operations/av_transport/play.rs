//! Play operation for AVTransport service

use xmltree::Element;

use crate::operations::DEFAULT_INSTANCE_ID;
use crate::{ApiError, Service, SonosOperation};

/// Play operation
pub struct PlayOperation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRequest {
    pub instance_id: u32,
    /// Playback speed; zone players only accept "1"
    pub speed: String,
}

impl Default for PlayRequest {
    fn default() -> Self {
        Self {
            instance_id: DEFAULT_INSTANCE_ID,
            speed: "1".to_string(),
        }
    }
}

impl SonosOperation for PlayOperation {
    type Request = PlayRequest;
    type Response = ();

    const SERVICE: Service = Service::AVTransport;
    const ACTION: &'static str = "Play";

    fn build_payload(request: &Self::Request) -> String {
        format!(
            "<InstanceID>{}</InstanceID><Speed>{}</Speed>",
            request.instance_id, request.speed
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
    fn test_play_payload() {
        assert_eq!(
            PlayOperation::build_payload(&PlayRequest::default()),
            "<InstanceID>0</InstanceID><Speed>1</Speed>"
        );
    }

    #[test]
    fn test_play_response_parsing() {
        let xml = Element::parse(r#"<PlayResponse></PlayResponse>"#.as_bytes()).unwrap();
        assert!(PlayOperation::parse_response(&xml).is_ok());
    }
}
