//! Driver configuration
//!
//! Defaults match the timings zone players are known to work well with:
//! a sweep every 30 seconds, zones reported offline after a minute without
//! a sighting, and half-hour event subscriptions.

use std::time::Duration;

use crate::error::{DriverError, Result};

pub const ENV_DISCOVERY_INTERVAL: &str = "SONOS_DRIVER_DISCOVERY_INTERVAL_SECS";
pub const ENV_STALENESS: &str = "SONOS_DRIVER_STALENESS_SECS";
pub const ENV_DISCOVERY_TIMEOUT: &str = "SONOS_DRIVER_DISCOVERY_TIMEOUT_SECS";
pub const ENV_CALLBACK_PORTS: &str = "SONOS_DRIVER_CALLBACK_PORTS";

/// Configuration for [`SonosDriver`](crate::SonosDriver) and its transports
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    /// Time between discovery sweeps
    /// Default: 30 seconds
    pub discovery_interval: Duration,

    /// A zone unseen for longer than this is reported offline
    /// Default: 60 seconds
    pub staleness_threshold: Duration,

    /// How long one SSDP search and each description fetch may take
    /// Default: 3 seconds
    pub discovery_timeout: Duration,

    /// Port range for the event callback server
    /// Default: (3400, 3500)
    pub callback_port_range: (u16, u16),

    /// Lifetime requested for event subscriptions
    /// Default: 1800 seconds
    pub subscription_timeout: Duration,

    /// Subscriptions are renewed once their remaining lifetime drops below this
    /// Default: 300 seconds
    pub renewal_threshold: Duration,

    /// Device volume corresponding to a level of 1.0
    /// Default: 100
    pub max_volume: u16,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            discovery_interval: Duration::from_secs(30),
            staleness_threshold: Duration::from_secs(60),
            discovery_timeout: Duration::from_secs(3),
            callback_port_range: (3400, 3500),
            subscription_timeout: Duration::from_secs(1800),
            renewal_threshold: Duration::from_secs(300),
            max_volume: 100,
        }
    }
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the `SONOS_DRIVER_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_DISCOVERY_INTERVAL) {
            config.discovery_interval = parse_secs(ENV_DISCOVERY_INTERVAL, &value)?;
        }
        if let Some(value) = lookup(ENV_STALENESS) {
            config.staleness_threshold = parse_secs(ENV_STALENESS, &value)?;
        }
        if let Some(value) = lookup(ENV_DISCOVERY_TIMEOUT) {
            config.discovery_timeout = parse_secs(ENV_DISCOVERY_TIMEOUT, &value)?;
        }
        if let Some(value) = lookup(ENV_CALLBACK_PORTS) {
            config.callback_port_range = parse_port_range(&value)?;
        }

        Ok(config)
    }

    pub fn with_discovery_interval(mut self, interval: Duration) -> Self {
        self.discovery_interval = interval;
        self
    }

    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness_threshold = threshold;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_callback_port_range(mut self, start: u16, end: u16) -> Self {
        self.callback_port_range = (start, end);
        self
    }

    pub fn with_subscription_timeout(mut self, timeout: Duration) -> Self {
        self.subscription_timeout = timeout;
        self
    }

    pub fn with_renewal_threshold(mut self, threshold: Duration) -> Self {
        self.renewal_threshold = threshold;
        self
    }

    pub fn with_max_volume(mut self, max_volume: u16) -> Self {
        self.max_volume = max_volume;
        self
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.discovery_interval.is_zero() {
            return Err(DriverError::Config(
                "Discovery interval must be greater than 0".to_string(),
            ));
        }

        if self.staleness_threshold.is_zero() {
            return Err(DriverError::Config(
                "Staleness threshold must be greater than 0".to_string(),
            ));
        }

        if self.discovery_timeout.is_zero() {
            return Err(DriverError::Config(
                "Discovery timeout must be greater than 0".to_string(),
            ));
        }

        let (start, end) = self.callback_port_range;
        if start == 0 || start > end {
            return Err(DriverError::Config(format!(
                "Invalid callback port range {start}-{end}"
            )));
        }

        if self.subscription_timeout.as_secs() == 0 || self.subscription_timeout.as_secs() > u64::from(u32::MAX) {
            return Err(DriverError::Config(
                "Subscription timeout must be between 1 second and u32::MAX seconds".to_string(),
            ));
        }

        if self.renewal_threshold >= self.subscription_timeout {
            return Err(DriverError::Config(
                "Renewal threshold must be shorter than the subscription timeout".to_string(),
            ));
        }

        if self.max_volume == 0 {
            return Err(DriverError::Config(
                "Max volume must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_secs(variable: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| DriverError::Config(format!("{variable}: expected whole seconds, got '{value}'")))
}

fn parse_port_range(value: &str) -> Result<(u16, u16)> {
    let invalid = || {
        DriverError::Config(format!(
            "{ENV_CALLBACK_PORTS}: expected 'start-end', got '{value}'"
        ))
    };

    let (start, end) = value.trim().split_once('-').ok_or_else(invalid)?;
    let start = start.trim().parse().map_err(|_| invalid())?;
    let end = end.trim().parse().map_err(|_| invalid())?;
    Ok((start, end))
}
