//! Typed UPnP API for Sonos zone players
//!
//! Each UPnP action is a zero-sized type implementing [`SonosOperation`]; a
//! [`SonosClient`] turns the operation's request into a SOAP call through the
//! private `soap-client` crate and parses the reply into the operation's
//! response type.
//!
//! ```no_run
//! use sonos_api::SonosClient;
//! use sonos_api::operations::rendering_control::{GetVolumeOperation, GetVolumeRequest};
//!
//! let client = SonosClient::new();
//! let volume = client.execute::<GetVolumeOperation>(
//!     "192.168.1.100",
//!     1400,
//!     &GetVolumeRequest::master(),
//! )?;
//! println!("volume is {}", volume.current_volume);
//! # Ok::<(), sonos_api::ApiError>(())
//! ```
//!
//! Event subscriptions are handled by [`ManagedSubscription`], which tracks
//! expiry and supports renewal and resubscription.

pub mod client;
pub mod error;
pub mod operation;
pub mod operations;
pub mod service;
pub mod subscription;

pub use client::SonosClient;
pub use error::{ApiError, Result};
pub use operation::SonosOperation;
pub use service::{Service, ServiceInfo};
pub use subscription::ManagedSubscription;
