use xmltree::Element;

use crate::error::ApiError;
use crate::service::Service;

/// Base trait for all Sonos API operations
///
/// An operation names its service and SOAP action, knows how to render its
/// request as the body of the action element, and how to read the
/// `<{Action}Response>` element the device sends back.
pub trait SonosOperation {
    /// The request type for this operation
    type Request;

    /// The response type for this operation
    type Response;

    /// The UPnP service this operation belongs to
    const SERVICE: Service;

    /// The SOAP action name for this operation
    const ACTION: &'static str;

    /// Build the XML arguments that go inside the action element
    fn build_payload(request: &Self::Request) -> String;

    /// Parse the `<{Action}Response>` element into the typed response
    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError>;
}

/// Text of a required child element. An element that is present but empty
/// yields an empty string.
pub(crate) fn child_text(xml: &Element, name: &str) -> Result<String, ApiError> {
    let child = xml
        .get_child(name)
        .ok_or_else(|| ApiError::ParseError(format!("Missing {name} element")))?;
    Ok(child
        .get_text()
        .map(|text| text.into_owned())
        .unwrap_or_default())
}

/// Parse a required numeric child element
pub(crate) fn child_number<T: std::str::FromStr>(xml: &Element, name: &str) -> Result<T, ApiError> {
    let text = child_text(xml, name)?;
    text.trim()
        .parse()
        .map_err(|_| ApiError::ParseError(format!("Invalid {name} value: {text:?}")))
}

/// Parse a required UPnP boolean child element (`0`/`1`, `true`/`false`)
pub(crate) fn child_bool(xml: &Element, name: &str) -> Result<bool, ApiError> {
    let text = child_text(xml, name)?;
    match text.trim() {
        "1" | "true" | "True" => Ok(true),
        "0" | "false" | "False" => Ok(false),
        other => Err(ApiError::ParseError(format!("Invalid {name} value: {other:?}"))),
    }
}
