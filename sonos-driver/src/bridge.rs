//! Reactor bridge
//!
//! Every event notification is treated as "something changed somewhere":
//! the payload does not reliably say which zone it concerns, so each one
//! triggers a full refresh of every known zone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use crate::eventing::Notification;
use crate::registry::ZoneRegistry;

/// How often a blocked bridge checks whether it was asked to stop
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Result of refreshing every zone for one notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
}

/// Why [`ReactorBridge::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeExit {
    /// `running` was cleared
    Stopped,
    /// Every sender was dropped while the bridge was still meant to run
    ChannelClosed,
}

pub struct ReactorBridge {
    registry: Arc<ZoneRegistry>,
}

impl ReactorBridge {
    pub fn new(registry: Arc<ZoneRegistry>) -> Self {
        Self { registry }
    }

    /// Refresh every zone, one at a time, from a snapshot of the registry.
    /// A zone that fails is logged and skipped.
    pub fn on_notification(&self, notification: &Notification) -> RefreshSummary {
        tracing::debug!(sid = %notification.subscription_id, "event received, refreshing all zones");

        let mut summary = RefreshSummary::default();
        for player in self.registry.zones() {
            match player.refresh_state() {
                Ok(()) => summary.refreshed += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(zone = %player.zone_id(), error = %e, "failed to refresh zone");
                }
            }
        }
        summary
    }

    /// Handle notifications until `running` is cleared or the channel closes.
    pub fn run(&self, notifications: Receiver<Notification>, running: &AtomicBool) -> BridgeExit {
        tracing::debug!("reactor bridge started");

        while running.load(Ordering::SeqCst) {
            match notifications.recv_timeout(STOP_POLL_INTERVAL) {
                Ok(notification) => {
                    self.on_notification(&notification);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!("notification channel closed, zones now refresh only on discovery");
                    return BridgeExit::ChannelClosed;
                }
            }
        }

        tracing::debug!("reactor bridge stopped");
        BridgeExit::Stopped
    }
}
