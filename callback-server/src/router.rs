//! Event routing for HTTP callback notifications.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// An unparsed UPnP event notification received over HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    /// The subscription ID from the UPnP SID header
    pub subscription_id: String,
    /// The raw XML event body
    pub event_xml: String,
}

/// Forwards notifications for known subscription IDs to a channel.
///
/// Registration is synchronous so subscriptions can be managed from plain
/// threads as well as from async code.
#[derive(Clone)]
pub struct EventRouter {
    subscriptions: Arc<RwLock<HashSet<String>>>,
    event_sender: mpsc::UnboundedSender<NotificationPayload>,
}

impl EventRouter {
    pub fn new(event_sender: mpsc::UnboundedSender<NotificationPayload>) -> Self {
        Self {
            subscriptions: Arc::new(RwLock::new(HashSet::new())),
            event_sender,
        }
    }

    /// Start accepting notifications for `subscription_id`.
    pub fn register(&self, subscription_id: impl Into<String>) {
        self.subscriptions.write().insert(subscription_id.into());
    }

    /// Stop accepting notifications for `subscription_id`.
    pub fn unregister(&self, subscription_id: &str) {
        self.subscriptions.write().remove(subscription_id);
    }

    pub fn is_registered(&self, subscription_id: &str) -> bool {
        self.subscriptions.read().contains(subscription_id)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Forward an event if its subscription is registered.
    ///
    /// Returns `false` when the SID is unknown. A closed receiver is not an
    /// error; the event is dropped.
    pub fn route_event(&self, subscription_id: String, event_xml: String) -> bool {
        if !self.is_registered(&subscription_id) {
            return false;
        }

        let payload = NotificationPayload {
            subscription_id,
            event_xml,
        };
        if self.event_sender.send(payload).is_err() {
            tracing::debug!("notification receiver closed, dropping event");
        }
        true
    }
}
