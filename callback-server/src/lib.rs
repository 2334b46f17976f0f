//! UPnP callback server for receiving event notifications.
//!
//! Devices deliver GENA events as HTTP `NOTIFY` requests to the callback URL
//! given at subscription time. [`CallbackServer`] listens on a port from a
//! configured range and hands each request to an [`EventRouter`], which
//! forwards notifications for registered subscription IDs into one channel as
//! [`NotificationPayload`]s. The payload is not interpreted here.
//!
//! ```no_run
//! use callback_server::{CallbackServer, NotificationPayload};
//! use tokio::sync::mpsc;
//!
//! # async fn run() -> Result<(), callback_server::CallbackServerError> {
//! let (tx, mut rx) = mpsc::unbounded_channel::<NotificationPayload>();
//! let server = CallbackServer::new((3400, 3500), tx).await?;
//! server.router().register("uuid:RINCON_000E58A0123456_sub0000001");
//!
//! while let Some(notification) = rx.recv().await {
//!     println!("event for {}", notification.subscription_id);
//! }
//! server.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod router;
mod server;

pub use error::{CallbackServerError, Result};
pub use router::{EventRouter, NotificationPayload};
pub use server::CallbackServer;
