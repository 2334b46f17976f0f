//! Eventing transport
//!
//! [`Reactor`] runs the callback server on a dedicated thread with its own
//! tokio runtime and forwards every routed NOTIFY into one shared std
//! channel. [`SonosConnector`] opens connections and subscribes each new
//! device's transport and rendering events to the reactor, renewing the
//! subscriptions from a background thread.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use callback_server::{CallbackServer, EventRouter, NotificationPayload};
use parking_lot::Mutex;
use sonos_api::{ManagedSubscription, Service, SonosClient};
use sonos_discovery::Device;
use tokio::sync::oneshot;

use crate::config::DriverConfig;
use crate::connection::{Connector, DeviceConnection, SonosConnection};
use crate::error::{DriverError, Result};

/// Services whose events wake the reactor bridge
const EVENTED_SERVICES: [Service; 2] = [Service::AVTransport, Service::RenderingControl];

/// How often the renewal thread looks for subscriptions close to expiry
const RENEWAL_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// An event notification. Its content is only used for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subscription_id: String,
    pub body: String,
}

impl From<NotificationPayload> for Notification {
    fn from(payload: NotificationPayload) -> Self {
        Self {
            subscription_id: payload.subscription_id,
            body: payload.event_xml,
        }
    }
}

type Ready = std::result::Result<(String, Arc<EventRouter>), String>;

/// Callback server running on its own thread
pub struct Reactor {
    callback_url: String,
    router: Arc<EventRouter>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Reactor {
    /// Start on the first free port in `port_range`, advertising the
    /// address of the outbound interface.
    pub fn start(port_range: (u16, u16)) -> Result<(Self, Receiver<Notification>)> {
        Self::spawn(port_range, None)
    }

    /// Start on the first free port in `port_range`, advertising `ip`.
    pub fn start_on(port_range: (u16, u16), ip: IpAddr) -> Result<(Self, Receiver<Notification>)> {
        Self::spawn(port_range, Some(ip))
    }

    fn spawn(port_range: (u16, u16), ip: Option<IpAddr>) -> Result<(Self, Receiver<Notification>)> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Ready>(1);
        let (notification_tx, notification_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let thread = thread::Builder::new()
            .name("sonos-reactor".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("Failed to create tokio runtime: {e}")));
                        return;
                    }
                };

                rt.block_on(serve(port_range, ip, ready_tx, notification_tx, shutdown_rx));
            })
            .map_err(|e| DriverError::Transport(format!("Failed to spawn reactor thread: {e}")))?;

        let started = ready_rx
            .recv()
            .unwrap_or_else(|_| Err("reactor thread exited during startup".to_string()));

        match started {
            Ok((callback_url, router)) => {
                tracing::info!(%callback_url, "reactor started");
                let reactor = Self {
                    callback_url,
                    router,
                    shutdown_tx: Some(shutdown_tx),
                    thread: Some(thread),
                };
                Ok((reactor, notification_rx))
            }
            Err(reason) => {
                let _ = thread.join();
                Err(DriverError::Transport(reason))
            }
        }
    }

    /// URL devices are subscribed with
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    pub fn router(&self) -> Arc<EventRouter> {
        self.router.clone()
    }

    /// Stop the callback server and wait for its thread.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("reactor thread panicked");
            }
            tracing::info!("reactor stopped");
        }
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn serve(
    port_range: (u16, u16),
    ip: Option<IpAddr>,
    ready_tx: mpsc::SyncSender<Ready>,
    notification_tx: Sender<Notification>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let (payload_tx, mut payload_rx) = tokio::sync::mpsc::unbounded_channel();
    let started = match ip {
        Some(ip) => CallbackServer::bind(port_range, ip, payload_tx).await,
        None => CallbackServer::new(port_range, payload_tx).await,
    };

    let server = match started {
        Ok(server) => server,
        Err(e) => {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
    };
    let _ = ready_tx.send(Ok((server.base_url().to_string(), server.router().clone())));

    loop {
        tokio::select! {
            payload = payload_rx.recv() => match payload {
                Some(payload) => {
                    tracing::trace!(sid = %payload.subscription_id, "event received");
                    if notification_tx.send(payload.into()).is_err() {
                        tracing::debug!("notification receiver dropped, stopping reactor");
                        break;
                    }
                }
                None => break,
            },
            _ = &mut shutdown_rx => break,
        }
    }

    server.shutdown().await;
}

/// Subscription lifetime and renewal timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionSettings {
    pub timeout: Duration,
    pub renewal_threshold: Duration,
    pub check_interval: Duration,
}

impl SubscriptionSettings {
    pub fn from_config(config: &DriverConfig) -> Self {
        Self {
            timeout: config.subscription_timeout,
            renewal_threshold: config.renewal_threshold,
            check_interval: RENEWAL_CHECK_INTERVAL,
        }
    }

    fn timeout_seconds(&self) -> u32 {
        u32::try_from(self.timeout.as_secs()).unwrap_or(u32::MAX)
    }
}

/// Outcome of one renewal pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenewalReport {
    pub renewed: usize,
    pub resubscribed: usize,
    /// Subscriptions given up on, including healthy ones of the same device
    pub dropped: usize,
}

struct DeviceSubscription {
    device_id: String,
    subscription: ManagedSubscription,
}

struct ConnectorState {
    client: SonosClient,
    router: Arc<EventRouter>,
    callback_url: String,
    settings: SubscriptionSettings,
    connections: Mutex<HashMap<String, Arc<SonosConnection>>>,
    subscriptions: Mutex<Vec<DeviceSubscription>>,
}

/// [`Connector`] that subscribes every new device to the reactor.
///
/// Connections are cached per device id, so later sweeps reuse them instead
/// of subscribing again. A device whose subscriptions cannot be kept alive
/// is forgotten and reconnected by the next sweep that sees it.
pub struct SonosConnector {
    state: Arc<ConnectorState>,
    renewal_stop: Mutex<Option<Sender<()>>>,
    renewal_thread: Mutex<Option<JoinHandle<()>>>,
}

impl SonosConnector {
    pub fn new(
        client: SonosClient,
        router: Arc<EventRouter>,
        callback_url: impl Into<String>,
        settings: SubscriptionSettings,
    ) -> Result<Self> {
        let state = Arc::new(ConnectorState {
            client,
            router,
            callback_url: callback_url.into(),
            settings,
            connections: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(Vec::new()),
        });

        let (stop_tx, stop_rx) = mpsc::channel();
        let renewal_state = state.clone();
        let renewal_thread = thread::Builder::new()
            .name("sonos-renewal".to_string())
            .spawn(move || run_renewal(renewal_state, stop_rx))
            .map_err(|e| DriverError::Transport(format!("Failed to spawn renewal thread: {e}")))?;

        Ok(Self {
            state,
            renewal_stop: Mutex::new(Some(stop_tx)),
            renewal_thread: Mutex::new(Some(renewal_thread)),
        })
    }

    /// Connector subscribing to `reactor` with the timing from `config`
    pub fn for_reactor(reactor: &Reactor, config: &DriverConfig) -> Result<Self> {
        Self::new(
            SonosClient::new(),
            reactor.router(),
            reactor.callback_url(),
            SubscriptionSettings::from_config(config),
        )
    }

    /// Renew every subscription close to expiry. Runs periodically on the
    /// renewal thread.
    pub fn renew_due(&self) -> RenewalReport {
        self.state.renew_due()
    }

    pub fn subscription_count(&self) -> usize {
        self.state.subscriptions.lock().len()
    }
}

impl Connector for SonosConnector {
    /// Reuse the device's connection while it stays at the same address. A
    /// device that moved has its old subscriptions cancelled and is
    /// connected again at the new address.
    fn connect(&self, device: &Device) -> Result<Arc<dyn DeviceConnection>> {
        let cached = self.state.connections.lock().get(&device.id).cloned();
        if let Some(existing) = cached {
            if existing.ip() == device.ip_address && existing.port() == device.port {
                return Ok(existing);
            }
            tracing::info!(
                device = %device.id,
                from = %format!("{}:{}", existing.ip(), existing.port()),
                to = %format!("{}:{}", device.ip_address, device.port),
                "zone player moved, reconnecting"
            );
            self.state.forget_devices(&HashSet::from([device.id.clone()]));
        }

        let connection = Arc::new(SonosConnection::for_device(self.state.client.clone(), device));
        let subscriptions = self.state.subscribe_device(device)?;
        tracing::info!(
            device = %device.id,
            ip = %device.ip_address,
            subscriptions = subscriptions.len(),
            "connected to zone player"
        );

        self.state
            .subscriptions
            .lock()
            .extend(subscriptions.into_iter().map(|subscription| DeviceSubscription {
                device_id: device.id.clone(),
                subscription,
            }));
        self.state
            .connections
            .lock()
            .insert(device.id.clone(), connection.clone());

        Ok(connection)
    }

    /// Stop renewing and cancel every subscription.
    fn close(&self) {
        self.renewal_stop.lock().take();
        if let Some(thread) = self.renewal_thread.lock().take() {
            if thread.join().is_err() {
                tracing::warn!("renewal thread panicked");
            }
        }

        let subscriptions: Vec<_> = self.state.subscriptions.lock().drain(..).collect();
        for entry in subscriptions {
            self.state.release(entry);
        }
        self.state.connections.lock().clear();
    }
}

impl ConnectorState {
    /// Subscribe every evented service, undoing the ones already made if any fails.
    fn subscribe_device(&self, device: &Device) -> Result<Vec<ManagedSubscription>> {
        let mut subscribed: Vec<ManagedSubscription> = Vec::with_capacity(EVENTED_SERVICES.len());

        for service in EVENTED_SERVICES {
            let result = self.client.subscribe(
                &device.ip_address,
                device.port,
                service,
                &self.callback_url,
                self.settings.timeout_seconds(),
            );

            match result {
                Ok(subscription) => {
                    self.router.register(subscription.subscription_id());
                    subscribed.push(subscription);
                }
                Err(e) => {
                    for subscription in subscribed {
                        self.release(DeviceSubscription {
                            device_id: device.id.clone(),
                            subscription,
                        });
                    }
                    return Err(DriverError::DeviceConnection {
                        device: device.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(subscribed)
    }

    fn renew_due(&self) -> RenewalReport {
        let mut report = RenewalReport::default();
        let mut lost_devices = HashSet::new();
        let threshold = self.settings.renewal_threshold;

        let mut subscriptions = self.subscriptions.lock();
        for entry in subscriptions.iter_mut() {
            if !entry.subscription.needs_renewal(threshold) {
                continue;
            }

            let renewal = match entry.subscription.renew() {
                Ok(()) => {
                    report.renewed += 1;
                    continue;
                }
                Err(e) => e,
            };
            tracing::warn!(
                device = %entry.device_id,
                sid = %entry.subscription.subscription_id(),
                error = %renewal,
                "renewal failed, subscribing again"
            );

            match entry.subscription.resubscribe() {
                Ok(old_sid) => {
                    self.router.unregister(&old_sid);
                    self.router.register(entry.subscription.subscription_id());
                    report.resubscribed += 1;
                }
                Err(e) => {
                    tracing::warn!(device = %entry.device_id, error = %e, "resubscribe failed, dropping device subscriptions");
                    lost_devices.insert(entry.device_id.clone());
                }
            }
        }

        drop(subscriptions);

        if !lost_devices.is_empty() {
            report.dropped = self.forget_devices(&lost_devices);
        }
        report
    }

    /// Cancel every subscription of `device_ids` and forget their
    /// connections. Returns how many subscriptions were cancelled.
    fn forget_devices(&self, device_ids: &HashSet<String>) -> usize {
        let lost: Vec<_> = {
            let mut subscriptions = self.subscriptions.lock();
            let (lost, kept): (Vec<_>, Vec<_>) = subscriptions
                .drain(..)
                .partition(|entry| device_ids.contains(&entry.device_id));
            *subscriptions = kept;
            lost
        };

        {
            let mut connections = self.connections.lock();
            for device_id in device_ids {
                connections.remove(device_id);
            }
        }

        let count = lost.len();
        for entry in lost {
            self.release(entry);
        }
        count
    }

    /// Stop routing a subscription's events and cancel it on the device.
    fn release(&self, entry: DeviceSubscription) {
        self.router.unregister(entry.subscription.subscription_id());
        if let Err(e) = entry.subscription.unsubscribe() {
            tracing::debug!(device = %entry.device_id, error = %e, "unsubscribe failed");
        }
    }
}

fn run_renewal(state: Arc<ConnectorState>, stop_rx: Receiver<()>) {
    loop {
        match stop_rx.recv_timeout(state.settings.check_interval) {
            Err(RecvTimeoutError::Timeout) => {
                let report = state.renew_due();
                if report != RenewalReport::default() {
                    tracing::debug!(?report, "subscription renewal pass");
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
