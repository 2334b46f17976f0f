//! Driver orchestrator
//!
//! Owns the zone registry and runs two background threads: the discovery
//! scheduler, which sweeps immediately and then every
//! `discovery_interval`, and the reactor bridge, which refreshes every zone
//! on each event notification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::bridge::{BridgeExit, ReactorBridge};
use crate::bus::{DriverBus, MediaPlayerCommands};
use crate::config::DriverConfig;
use crate::connection::Connector;
use crate::discovery::{DiscoveryTransport, ZoneDiscovery, ZoneInfo, ZoneMap};
use crate::error::{DriverError, Result};
use crate::eventing::Notification;
use crate::model::{AnnouncedDevice, DriverInfo};
use crate::player::ZonePlayer;
use crate::registry::{SweepReport, ZoneRegistry};

/// Runs sweeps and turns new zones into announced players
struct Sweeper {
    discovery: ZoneDiscovery,
    registry: Arc<ZoneRegistry>,
    bus: Arc<dyn DriverBus>,
    max_volume: u16,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the sweep ends, even by panic
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Sweeper {
    /// `Ok(None)` when another sweep is still running
    fn sweep(&self) -> Result<Option<SweepReport>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("discovery sweep still in flight, skipping");
            return Ok(None);
        }
        let _guard = InFlight(&self.in_flight);

        let zones = match self.discovery.discover() {
            Ok(zones) => zones,
            Err(e) => {
                // Nothing was sighted, so known zones keep ageing.
                self.registry
                    .reconcile(ZoneMap::new(), Instant::now(), |zone| self.create_player(zone));
                return Err(e);
            }
        };
        let report = self
            .registry
            .reconcile(zones, Instant::now(), |zone| self.create_player(zone));
        Ok(Some(report))
    }

    fn create_player(&self, zone: &ZoneInfo) -> Result<Arc<ZonePlayer>> {
        let coordinator = zone
            .coordinator()
            .ok_or_else(|| DriverError::DeviceConnection {
                device: zone.id.clone(),
                reason: "zone has no members".to_string(),
            })?;

        let device = self
            .bus
            .announce_device(AnnouncedDevice::zone_player(&zone.id, &zone.name))?;
        let player = Arc::new(ZonePlayer::new(
            zone.id.clone(),
            zone.name.clone(),
            coordinator.connection.clone(),
            device.clone(),
            self.max_volume,
        ));
        let commands: Arc<dyn MediaPlayerCommands> = player.clone();
        let commands: Weak<dyn MediaPlayerCommands> = Arc::downgrade(&commands);
        device.bind_commands(commands);

        if let Err(e) = player.refresh_state() {
            tracing::warn!(zone = %zone.id, error = %e, "initial refresh failed");
        }
        Ok(player)
    }
}

pub struct SonosDriver {
    config: DriverConfig,
    registry: Arc<ZoneRegistry>,
    sweeper: Arc<Sweeper>,
    bus: Arc<dyn DriverBus>,
    notifications: Option<Receiver<Notification>>,
    running: Arc<AtomicBool>,
    reacting: Arc<AtomicBool>,
    discovery_stop: Option<Sender<()>>,
    threads: Vec<JoinHandle<()>>,
}

impl SonosDriver {
    pub fn new(
        config: DriverConfig,
        transport: Arc<dyn DiscoveryTransport>,
        connector: Arc<dyn Connector>,
        bus: Arc<dyn DriverBus>,
        notifications: Receiver<Notification>,
    ) -> Self {
        let registry = Arc::new(ZoneRegistry::new(config.staleness_threshold));
        let sweeper = Arc::new(Sweeper {
            discovery: ZoneDiscovery::new(transport, connector),
            registry: registry.clone(),
            bus: bus.clone(),
            max_volume: config.max_volume,
            in_flight: AtomicBool::new(false),
        });

        Self {
            config,
            registry,
            sweeper,
            bus,
            notifications: Some(notifications),
            running: Arc::new(AtomicBool::new(false)),
            reacting: Arc::new(AtomicBool::new(false)),
            discovery_stop: None,
            threads: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ZoneRegistry> {
        &self.registry
    }

    /// Player for `zone_id`, the target of bus commands
    pub fn player(&self, zone_id: &str) -> Option<Arc<ZonePlayer>> {
        self.registry.get(zone_id)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether event notifications still reach the zones. Cleared when the
    /// bridge stops, including when the notification channel closes under a
    /// running driver.
    pub fn is_reacting(&self) -> bool {
        self.reacting.load(Ordering::SeqCst)
    }

    /// Run one sweep on the calling thread. `Ok(None)` if one is already running.
    pub fn sweep_now(&self) -> Result<Option<SweepReport>> {
        self.sweeper.sweep()
    }

    /// Announce the driver and start the discovery and reactor threads.
    ///
    /// The first sweep starts right away. Calling `start` on a running
    /// driver does nothing.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            tracing::warn!("driver already started");
            return Ok(());
        }
        self.config.validate()?;

        let info = DriverInfo::sonos();
        self.bus.announce_driver(&info)?;
        self.bus.export_driver(&info)?;
        tracing::info!(id = %info.id, version = %info.version, "starting driver");

        self.running.store(true, Ordering::SeqCst);

        let (stop_tx, stop_rx) = mpsc::channel();
        let sweeper = self.sweeper.clone();
        let interval = self.config.discovery_interval;
        let discovery = thread::Builder::new()
            .name("sonos-discovery".to_string())
            .spawn(move || run_discovery(&sweeper, interval, stop_rx))
            .map_err(|e| DriverError::Transport(format!("Failed to spawn discovery thread: {e}")))?;
        self.discovery_stop = Some(stop_tx);
        self.threads.push(discovery);

        match self.notifications.take() {
            Some(notifications) => {
                let bridge = ReactorBridge::new(self.registry.clone());
                let running = self.running.clone();
                let reacting = self.reacting.clone();
                reacting.store(true, Ordering::SeqCst);
                let reactor = thread::Builder::new()
                    .name("sonos-bridge".to_string())
                    .spawn(move || {
                        if bridge.run(notifications, &running) == BridgeExit::ChannelClosed {
                            tracing::debug!("bridge thread ending without a stop request");
                        }
                        reacting.store(false, Ordering::SeqCst);
                    })
                    .map_err(|e| {
                        self.reacting.store(false, Ordering::SeqCst);
                        DriverError::Transport(format!("Failed to spawn bridge thread: {e}"))
                    })?;
                self.threads.push(reactor);
            }
            None => tracing::warn!("notification channel already consumed, zones refresh only on discovery"),
        }

        Ok(())
    }

    /// Stop both threads, wait for them and close the transports.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.discovery_stop.take();
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("driver thread panicked");
            }
        }
        self.sweeper.discovery.close();
        tracing::info!("driver stopped");
    }
}

impl Drop for SonosDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_discovery(sweeper: &Sweeper, interval: Duration, stop_rx: Receiver<()>) {
    loop {
        match sweeper.sweep() {
            Ok(Some(report)) => tracing::debug!(
                added = report.added.len(),
                seen = report.seen.len(),
                went_stale = report.went_stale.len(),
                came_back = report.came_back.len(),
                "discovery sweep finished"
            ),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "discovery sweep failed"),
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::PlayerCommand;
    use crate::fakes::{device, FakeConnector, FakeTransport, Published, RecordingBus};
    use crate::model::{ControlState, VolumeState};
    use crate::registry::ZoneStatus;

    struct Harness {
        driver: SonosDriver,
        transport: Arc<FakeTransport>,
        connector: Arc<FakeConnector>,
        bus: Arc<RecordingBus>,
        events: Sender<Notification>,
    }

    fn harness(config: DriverConfig, transport: FakeTransport, connector: FakeConnector, bus: RecordingBus) -> Harness {
        let transport = Arc::new(transport);
        let connector = Arc::new(connector);
        let bus = Arc::new(bus);
        let (events, notifications) = mpsc::channel();
        let driver = SonosDriver::new(config, transport.clone(), connector.clone(), bus.clone(), notifications);
        Harness {
            driver,
            transport,
            connector,
            bus,
            events,
        }
    }

    fn living_room() -> Harness {
        harness(
            DriverConfig::default(),
            FakeTransport::new(vec![device("uuid:RINCON_1", "192.168.1.10")]),
            FakeConnector::new().with_zone("uuid:RINCON_1", "RINCON_1", "Living Room"),
            RecordingBus::new(),
        )
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_new_zone_is_announced_and_refreshed() {
        let h = living_room();

        let report = h.driver.sweep_now().unwrap().unwrap();
        assert_eq!(report.added, ["RINCON_1"]);
        assert_eq!(h.driver.registry().len(), 1);

        let announced = h.bus.devices.lock()[0].0.clone();
        assert_eq!(announced.natural_id, "RINCON_1");
        assert_eq!(announced.name, "Living Room");
        assert_eq!(announced.signatures["ninja:manufacturer"], "Sonos");

        let device = h.bus.device("RINCON_1").unwrap();
        assert_eq!(
            device.published(),
            [
                Published::Media(None, None),
                Published::Volume(VolumeState::new(Some(0.5), Some(false))),
                Published::Control(ControlState::Stopped),
            ]
        );
    }

    #[test]
    fn test_volume_command_reaches_the_device() {
        let h = living_room();
        h.driver.sweep_now().unwrap();
        let device = h.bus.device("RINCON_1").unwrap();
        device.clear();

        let player = h.driver.player("RINCON_1").unwrap();
        player.set_volume(VolumeState::new(Some(0.8), Some(false))).unwrap();

        let calls = h.connector.connection("uuid:RINCON_1").calls();
        assert_eq!(calls[calls.len() - 2..], ["set_volume:Master:80", "set_mute:Master:false"]);
        assert_eq!(
            device.published(),
            [Published::Volume(VolumeState::new(Some(0.8), Some(false)))]
        );
    }

    #[test]
    fn test_bus_command_reaches_the_zone_player() {
        let h = living_room();
        h.driver.sweep_now().unwrap();
        let device = h.bus.device("RINCON_1").unwrap();
        device.clear();

        device.deliver(PlayerCommand::PlayPause(true)).unwrap();
        device.deliver(PlayerCommand::PlaylistJump(-2)).unwrap();

        let calls = h.connector.connection("uuid:RINCON_1").calls();
        assert_eq!(calls[calls.len() - 2..], ["play:0:1", "previous"]);
        assert_eq!(device.published(), [Published::Control(ControlState::Playing)]);
    }

    #[test]
    fn test_bus_command_failure_is_returned_to_the_bus() {
        let h = living_room();
        h.driver.sweep_now().unwrap();
        h.connector.connection("uuid:RINCON_1").fail("stop");

        let device = h.bus.device("RINCON_1").unwrap();
        assert!(matches!(device.deliver(PlayerCommand::Stop), Err(DriverError::Protocol(_))));
    }

    #[test]
    fn test_one_bad_device_does_not_block_another_zone() {
        let h = harness(
            DriverConfig::default(),
            FakeTransport::new(vec![
                device("uuid:RINCON_BAD", "192.168.1.10"),
                device("uuid:RINCON_2", "192.168.1.11"),
            ]),
            FakeConnector::new()
                .with_failure("uuid:RINCON_BAD")
                .with_zone("uuid:RINCON_2", "RINCON_2", "Kitchen"),
            RecordingBus::new(),
        );

        let report = h.driver.sweep_now().unwrap().unwrap();
        assert_eq!(report.added, ["RINCON_2"]);
    }

    #[test]
    fn test_rejected_announcement_is_retried() {
        let h = harness(
            DriverConfig::default(),
            FakeTransport::new(vec![
                device("uuid:RINCON_1", "192.168.1.10"),
                device("uuid:RINCON_2", "192.168.1.11"),
            ]),
            FakeConnector::new()
                .with_zone("uuid:RINCON_1", "RINCON_1", "Den")
                .with_zone("uuid:RINCON_2", "RINCON_2", "Kitchen"),
            RecordingBus::new().rejecting("RINCON_1"),
        );

        let first = h.driver.sweep_now().unwrap().unwrap();
        let second = h.driver.sweep_now().unwrap().unwrap();

        assert_eq!(first.added, ["RINCON_2"]);
        assert!(second.added.is_empty());
        assert_eq!(second.seen, ["RINCON_2"]);
        assert!(h.driver.player("RINCON_1").is_none());
    }

    #[test]
    fn test_transport_failure_is_an_error_for_that_sweep() {
        let h = harness(
            DriverConfig::default(),
            FakeTransport::failing(),
            FakeConnector::new(),
            RecordingBus::new(),
        );
        assert!(matches!(h.driver.sweep_now(), Err(DriverError::Transport(_))));
        assert!(h.driver.registry().is_empty());
    }

    #[test]
    fn test_zones_go_stale_while_the_transport_is_down() {
        let h = harness(
            DriverConfig::default().with_staleness_threshold(Duration::from_millis(10)),
            FakeTransport::new(vec![device("uuid:RINCON_1", "192.168.1.10")]),
            FakeConnector::new().with_zone("uuid:RINCON_1", "RINCON_1", "Living Room"),
            RecordingBus::new(),
        );
        h.driver.sweep_now().unwrap();
        assert_eq!(h.driver.registry().status("RINCON_1"), Some(ZoneStatus::Tracked));

        h.transport.fail();
        thread::sleep(Duration::from_millis(30));

        assert!(matches!(h.driver.sweep_now(), Err(DriverError::Transport(_))));
        assert_eq!(h.driver.registry().status("RINCON_1"), Some(ZoneStatus::Stale));
        assert!(h.driver.player("RINCON_1").is_some());
    }

    #[test]
    fn test_overlapping_sweep_is_skipped() {
        let h = living_room();
        h.driver.sweeper.in_flight.store(true, Ordering::SeqCst);

        assert_eq!(h.driver.sweep_now().unwrap(), None);
        assert!(h.connector.connect_attempts().is_empty());

        h.driver.sweeper.in_flight.store(false, Ordering::SeqCst);
        assert!(h.driver.sweep_now().unwrap().is_some());
    }

    #[test]
    fn test_start_sweeps_immediately_and_reacts_to_events() {
        let mut h = harness(
            DriverConfig::default().with_discovery_interval(Duration::from_secs(3600)),
            FakeTransport::new(vec![device("uuid:RINCON_1", "192.168.1.10")]),
            FakeConnector::new().with_zone("uuid:RINCON_1", "RINCON_1", "Living Room"),
            RecordingBus::new(),
        );

        h.driver.start().unwrap();
        assert!(h.driver.is_running());
        assert_eq!(h.bus.drivers.lock().as_slice(), [DriverInfo::sonos()]);
        assert!(wait_for(|| h.driver.registry().len() == 1));

        let device = h.bus.device("RINCON_1").unwrap();
        assert!(wait_for(|| device.published().len() == 3));

        h.connector.connection("uuid:RINCON_1").state.lock().transport_state = "PLAYING".to_string();
        h.events
            .send(Notification {
                subscription_id: "uuid:RINCON_1_sub1".to_string(),
                body: String::new(),
            })
            .unwrap();
        assert!(wait_for(|| {
            device.published().last() == Some(&Published::Control(ControlState::Playing))
        }));

        h.driver.stop();
        assert!(!h.driver.is_running());
    }

    #[test]
    fn test_closed_notification_channel_is_reported() {
        let mut h = harness(
            DriverConfig::default().with_discovery_interval(Duration::from_secs(3600)),
            FakeTransport::new(Vec::new()),
            FakeConnector::new(),
            RecordingBus::new(),
        );
        assert!(!h.driver.is_reacting());

        h.driver.start().unwrap();
        assert!(h.driver.is_reacting());

        drop(h.events);

        assert!(wait_for(|| !h.driver.is_reacting()));
        assert!(h.driver.is_running());
        h.driver.stop();
    }

    #[test]
    fn test_start_rejects_invalid_config() {
        let mut h = harness(
            DriverConfig::default().with_callback_port_range(3500, 3400),
            FakeTransport::new(Vec::new()),
            FakeConnector::new(),
            RecordingBus::new(),
        );

        assert!(matches!(h.driver.start(), Err(DriverError::Config(_))));
        assert!(!h.driver.is_running());
        assert!(h.bus.drivers.lock().is_empty());
    }
}
