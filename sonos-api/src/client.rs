use soap_client::SoapClient;

use crate::{ManagedSubscription, Result, Service, SonosOperation};

/// Executes [`SonosOperation`]s against a device over SOAP.
///
/// Cloning is cheap; clones share the underlying HTTP agent.
#[derive(Debug, Clone, Default)]
pub struct SonosClient {
    soap_client: SoapClient,
}

impl SonosClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client around a preconfigured SOAP client
    pub fn with_soap_client(soap_client: SoapClient) -> Self {
        Self { soap_client }
    }

    /// Send `Op` with `request` to the device at `ip:port` and parse the reply.
    pub fn execute<Op: SonosOperation>(
        &self,
        ip: &str,
        port: u16,
        request: &Op::Request,
    ) -> Result<Op::Response> {
        let service_info = Op::SERVICE.info();
        let payload = Op::build_payload(request);

        let xml = self.soap_client.call(
            ip,
            port,
            service_info.endpoint,
            service_info.service_uri,
            Op::ACTION,
            &payload,
        )?;

        Op::parse_response(&xml)
    }

    /// Subscribe `callback_url` to events from `service` on the device.
    pub fn subscribe(
        &self,
        ip: &str,
        port: u16,
        service: Service,
        callback_url: &str,
        timeout_seconds: u32,
    ) -> Result<ManagedSubscription> {
        ManagedSubscription::create(
            self.soap_client.clone(),
            ip.to_string(),
            port,
            service,
            callback_url.to_string(),
            timeout_seconds,
        )
    }
}
