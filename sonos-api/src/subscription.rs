//! UPnP event subscription with expiry tracking
//!
//! A subscription lives for the timeout the device granted. It has to be
//! renewed before then or the device silently stops sending NOTIFY requests.

use crate::{ApiError, Result, Service};
use soap_client::SoapClient;
use std::time::{Duration, Instant};

/// An active GENA subscription to one service on one device.
#[derive(Debug)]
pub struct ManagedSubscription {
    sid: String,
    device_ip: String,
    device_port: u16,
    service: Service,
    callback_url: String,
    timeout_seconds: u32,
    expires_at: Instant,
    soap_client: SoapClient,
}

impl ManagedSubscription {
    pub(crate) fn create(
        soap_client: SoapClient,
        device_ip: String,
        device_port: u16,
        service: Service,
        callback_url: String,
        timeout_seconds: u32,
    ) -> Result<Self> {
        let event_endpoint = service.info().event_endpoint;
        let response = soap_client
            .subscribe(
                &device_ip,
                device_port,
                event_endpoint,
                &callback_url,
                timeout_seconds,
            )
            .map_err(|e| ApiError::SubscriptionError(format!("{service} subscribe failed: {e}")))?;

        Ok(Self {
            sid: response.sid,
            device_ip,
            device_port,
            service,
            callback_url,
            timeout_seconds: response.timeout_seconds,
            expires_at: Instant::now() + Duration::from_secs(response.timeout_seconds.into()),
            soap_client,
        })
    }

    /// The subscription ID the device assigned
    pub fn subscription_id(&self) -> &str {
        &self.sid
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn device_ip(&self) -> &str {
        &self.device_ip
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Time left before the device drops the subscription
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Whether less than `threshold` of the granted lifetime is left
    pub fn needs_renewal(&self, threshold: Duration) -> bool {
        self.remaining() <= threshold
    }

    /// Extend the subscription under its current SID.
    pub fn renew(&mut self) -> Result<()> {
        let granted = self
            .soap_client
            .renew_subscription(
                &self.device_ip,
                self.device_port,
                self.service.info().event_endpoint,
                &self.sid,
                self.timeout_seconds,
            )
            .map_err(|e| ApiError::SubscriptionError(format!("{} renewal failed: {e}", self.service)))?;

        self.timeout_seconds = granted;
        self.expires_at = Instant::now() + Duration::from_secs(granted.into());
        Ok(())
    }

    /// Replace the subscription with a fresh SUBSCRIBE to the same callback.
    ///
    /// Returns the SID that was replaced. The old SID is not cancelled on the
    /// device; it is assumed to have lapsed already.
    pub fn resubscribe(&mut self) -> Result<String> {
        let fresh = Self::create(
            self.soap_client.clone(),
            self.device_ip.clone(),
            self.device_port,
            self.service,
            self.callback_url.clone(),
            self.timeout_seconds,
        )?;

        let replaced = std::mem::replace(&mut self.sid, fresh.sid.clone());
        self.timeout_seconds = fresh.timeout_seconds;
        self.expires_at = fresh.expires_at;
        Ok(replaced)
    }

    /// Cancel the subscription on the device.
    pub fn unsubscribe(self) -> Result<()> {
        self.soap_client
            .unsubscribe(
                &self.device_ip,
                self.device_port,
                self.service.info().event_endpoint,
                &self.sid,
            )
            .map_err(|e| ApiError::SubscriptionError(format!("{} unsubscribe failed: {e}", self.service)))
    }
}
