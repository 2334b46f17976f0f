//! Sonos Driver
//!
//! Discovers Sonos zones on the local network, keeps a live model of each
//! zone's playback state and publishes it as media player devices on an
//! application bus.
//!
//! # Architecture
//!
//! ```text
//! SSDP sweep → ZoneDiscovery → ZoneRegistry → ZonePlayer → MediaPlayerDevice
//!                                   ↑
//! NOTIFY → Reactor → ReactorBridge ─┘ (refresh every zone)
//! ```
//!
//! A sweep runs at startup and then on a fixed interval. Every device found
//! is connected to, subscribed for events and grouped into its zone; new
//! zones are announced on the bus. Any event notification refreshes every
//! known zone. Commands from the bus reach a zone's [`ZonePlayer`] through
//! the device handle it was announced with.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sonos_driver::{DriverConfig, LoggingBus, Reactor, SonosConnector, SonosDriver, SsdpDiscovery};
//!
//! let config = DriverConfig::from_env()?;
//! let (reactor, notifications) = Reactor::start(config.callback_port_range)?;
//! let connector = SonosConnector::for_reactor(&reactor, &config)?;
//! let transport = SsdpDiscovery::new(config.discovery_timeout)?;
//!
//! let mut driver = SonosDriver::new(
//!     config,
//!     Arc::new(transport),
//!     Arc::new(connector),
//!     Arc::new(LoggingBus::new()),
//!     notifications,
//! );
//! driver.start()?;
//!
//! if let Some(player) = driver.player("RINCON_000E58A0123401400") {
//!     player.play_pause(true)?;
//! }
//! ```

pub mod bridge;
pub mod bus;
pub mod config;
pub mod connection;
pub mod discovery;
pub mod driver;
pub mod duration;
pub mod error;
pub mod eventing;
pub mod logging;
pub mod model;
pub mod player;
pub mod registry;

#[cfg(test)]
mod fakes;

pub use bridge::{BridgeExit, ReactorBridge, RefreshSummary};
pub use bus::{CommandBinding, DriverBus, LoggingBus, MediaPlayerCommands, MediaPlayerDevice, PlayerCommand};
pub use config::DriverConfig;
pub use connection::{Connector, DeviceConnection, SonosConnection};
pub use discovery::{DiscoveryTransport, SsdpDiscovery, ZoneDiscovery, ZoneInfo, ZoneMap, ZoneMember};
pub use driver::SonosDriver;
pub use error::{DriverError, Result};
pub use eventing::{Notification, Reactor, RenewalReport, SonosConnector, SubscriptionSettings};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use model::{
    AnnouncedDevice, Channel, ControlState, DriverInfo, MediaState, MusicTrack, VolumeState,
};
pub use player::{PlayerSnapshot, ZonePlayer};
pub use registry::{SweepReport, ZoneEvent, ZoneRegistry, ZoneStatus};
