//! Private SOAP client for UPnP device communication
//!
//! This crate provides a minimal SOAP client for talking to UPnP zone players.
//! It also speaks the GENA side of UPnP eventing (SUBSCRIBE/UNSUBSCRIBE), which
//! the driver uses to get a device to push change notifications to its callback
//! server.

mod error;

pub use error::SoapError;

use std::time::Duration;
use xmltree::Element;

/// Response from a UPnP subscription request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionResponse {
    /// Subscription ID returned by the device
    pub sid: String,
    /// Actual timeout granted by the device (in seconds)
    pub timeout_seconds: u32,
}

/// A minimal SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a new SOAP client with default timeouts (5s connect, 10s read)
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(5), Duration::from_secs(10))
    }

    /// Create a SOAP client with explicit connect and read timeouts
    pub fn with_timeouts(connect: Duration, read: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(connect)
                .timeout_read(read)
                .build(),
        }
    }

    /// Send a SOAP request and return the `<{action}Response>` element
    pub fn call(
        &self,
        ip: &str,
        port: u16,
        endpoint: &str,
        service_uri: &str,
        action: &str,
        payload: &str,
    ) -> Result<Element, SoapError> {
        let body = format!(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action} xmlns:u="{service_uri}">{payload}</u:{action}></s:Body></s:Envelope>"#
        );

        let url = format!("http://{ip}:{port}/{endpoint}");
        let soap_action = format!("\"{service_uri}#{action}\"");

        tracing::trace!(%url, action, "sending SOAP request");

        let xml_text = match self
            .agent
            .post(&url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body)
        {
            Ok(response) => response
                .into_string()
                .map_err(|e| SoapError::Network(e.to_string()))?,
            // UPnP devices report faults with HTTP 500 and a SOAP body
            Err(ureq::Error::Status(500, response)) => response
                .into_string()
                .map_err(|e| SoapError::Network(e.to_string()))?,
            Err(ureq::Error::Status(status, _)) => {
                return Err(SoapError::Status {
                    method: "POST",
                    status,
                })
            }
            Err(e) => return Err(SoapError::Network(e.to_string())),
        };

        let xml = Element::parse(xml_text.as_bytes()).map_err(|e| SoapError::Parse(e.to_string()))?;

        self.extract_response(&xml, action)
    }

    /// Subscribe to UPnP events for a service event endpoint
    ///
    /// # Arguments
    /// * `ip` - Device IP address
    /// * `port` - Device port (typically 1400)
    /// * `event_endpoint` - Event endpoint path (e.g., "MediaRenderer/AVTransport/Event")
    /// * `callback_url` - URL where events should be sent
    /// * `timeout_seconds` - Requested subscription timeout in seconds
    pub fn subscribe(
        &self,
        ip: &str,
        port: u16,
        event_endpoint: &str,
        callback_url: &str,
        timeout_seconds: u32,
    ) -> Result<SubscriptionResponse, SoapError> {
        let url = format!("http://{ip}:{port}/{event_endpoint}");

        let response = self
            .agent
            .request("SUBSCRIBE", &url)
            .set("HOST", &format!("{ip}:{port}"))
            .set("CALLBACK", &format!("<{callback_url}>"))
            .set("NT", "upnp:event")
            .set("TIMEOUT", &format!("Second-{timeout_seconds}"))
            .call()
            .map_err(|e| map_gena_error("SUBSCRIBE", e))?;

        let sid = response
            .header("SID")
            .ok_or_else(|| SoapError::Parse("Missing SID header in SUBSCRIBE response".to_string()))?
            .to_string();

        let timeout_seconds = response
            .header("TIMEOUT")
            .and_then(parse_timeout_header)
            .unwrap_or(timeout_seconds);

        tracing::debug!(%url, %sid, timeout_seconds, "subscribed");

        Ok(SubscriptionResponse {
            sid,
            timeout_seconds,
        })
    }

    /// Renew an existing UPnP subscription, returning the granted timeout
    pub fn renew_subscription(
        &self,
        ip: &str,
        port: u16,
        event_endpoint: &str,
        sid: &str,
        timeout_seconds: u32,
    ) -> Result<u32, SoapError> {
        let url = format!("http://{ip}:{port}/{event_endpoint}");

        let response = self
            .agent
            .request("SUBSCRIBE", &url)
            .set("HOST", &format!("{ip}:{port}"))
            .set("SID", sid)
            .set("TIMEOUT", &format!("Second-{timeout_seconds}"))
            .call()
            .map_err(|e| map_gena_error("SUBSCRIBE", e))?;

        Ok(response
            .header("TIMEOUT")
            .and_then(parse_timeout_header)
            .unwrap_or(timeout_seconds))
    }

    /// Cancel a UPnP subscription
    pub fn unsubscribe(
        &self,
        ip: &str,
        port: u16,
        event_endpoint: &str,
        sid: &str,
    ) -> Result<(), SoapError> {
        let url = format!("http://{ip}:{port}/{event_endpoint}");

        self.agent
            .request("UNSUBSCRIBE", &url)
            .set("HOST", &format!("{ip}:{port}"))
            .set("SID", sid)
            .call()
            .map_err(|e| map_gena_error("UNSUBSCRIBE", e))?;

        Ok(())
    }

    fn extract_response(&self, xml: &Element, action: &str) -> Result<Element, SoapError> {
        let body = xml
            .get_child("Body")
            .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

        if let Some(fault) = body.get_child("Fault") {
            let error_code = fault
                .get_child("detail")
                .and_then(|d| d.get_child("UPnPError"))
                .and_then(|e| e.get_child("errorCode"))
                .and_then(|c| c.get_text())
                .and_then(|t| t.trim().parse::<u16>().ok())
                .unwrap_or(500);
            return Err(SoapError::Fault(error_code));
        }

        let response_name = format!("{action}Response");
        body.get_child(response_name.as_str())
            .cloned()
            .ok_or_else(|| SoapError::Parse(format!("Missing {response_name} element")))
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

fn map_gena_error(method: &'static str, error: ureq::Error) -> SoapError {
    match error {
        ureq::Error::Status(status, _) => SoapError::Status { method, status },
        other => SoapError::Network(other.to_string()),
    }
}

/// Parse a GENA `TIMEOUT` header of the form `Second-1800`
fn parse_timeout_header(value: &str) -> Option<u32> {
    value.trim().strip_prefix("Second-")?.parse::<u32>().ok()
}
