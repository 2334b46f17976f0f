//! Long-lived set of known zones
//!
//! Zones are added the first time a sweep reports them and are never
//! removed. A zone missing from sweeps for longer than the staleness
//! threshold is marked stale once; seeing it again marks it tracked and
//! keeps the same [`ZonePlayer`].

use std::collections::{BTreeMap, HashSet};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::discovery::{ZoneInfo, ZoneMap};
use crate::error::Result;
use crate::player::ZonePlayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneStatus {
    Tracked,
    Stale,
}

/// Liveness change of a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneEvent {
    Offline(String),
    Online(String),
}

/// What one [`ZoneRegistry::reconcile`] call changed. Each list holds zone ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Zones seen for the first time
    pub added: Vec<String>,
    /// Already known zones that were seen again
    pub seen: Vec<String>,
    /// Zones marked stale by this sweep
    pub went_stale: Vec<String>,
    /// Stale zones that were seen again
    pub came_back: Vec<String>,
}

struct ZoneEntry {
    player: Arc<ZonePlayer>,
    last_seen: Instant,
    status: ZoneStatus,
}

pub struct ZoneRegistry {
    zones: Mutex<BTreeMap<String, ZoneEntry>>,
    staleness_threshold: Duration,
    observer: Mutex<Option<Sender<ZoneEvent>>>,
}

impl ZoneRegistry {
    pub fn new(staleness_threshold: Duration) -> Self {
        Self {
            zones: Mutex::new(BTreeMap::new()),
            staleness_threshold,
            observer: Mutex::new(None),
        }
    }

    /// Send [`ZoneEvent`]s to `observer` from now on
    pub fn set_observer(&self, observer: Sender<ZoneEvent>) {
        *self.observer.lock() = Some(observer);
    }

    /// Fold one sweep's result into the registry.
    ///
    /// `create_player` builds the player for each zone not seen before. It is
    /// called without the registry lock held; a zone it fails for is left out
    /// and offered again by the next sweep.
    pub fn reconcile<F>(&self, discovered: ZoneMap, now: Instant, mut create_player: F) -> SweepReport
    where
        F: FnMut(&ZoneInfo) -> Result<Arc<ZonePlayer>>,
    {
        let mut report = SweepReport::default();
        let mut events = Vec::new();
        let mut sighted = HashSet::new();

        let new_zones: Vec<ZoneInfo> = {
            let mut zones = self.zones.lock();
            discovered
                .into_values()
                .filter_map(|zone| {
                    sighted.insert(zone.id.clone());
                    let entry = match zones.get_mut(&zone.id) {
                        Some(entry) => entry,
                        None => return Some(zone),
                    };

                    entry.last_seen = now;
                    if entry.status == ZoneStatus::Stale {
                        entry.status = ZoneStatus::Tracked;
                        report.came_back.push(zone.id.clone());
                        events.push(ZoneEvent::Online(zone.id.clone()));
                    }
                    report.seen.push(zone.id);
                    None
                })
                .collect()
        };

        for zone in new_zones {
            match create_player(&zone) {
                Ok(player) => {
                    tracing::info!(zone = %zone.id, name = %zone.name, members = zone.members.len(), "found a new zone");
                    self.zones.lock().insert(
                        zone.id.clone(),
                        ZoneEntry {
                            player,
                            last_seen: now,
                            status: ZoneStatus::Tracked,
                        },
                    );
                    report.added.push(zone.id);
                }
                Err(e) => {
                    tracing::warn!(zone = %zone.id, error = %e, "failed to set up zone, will retry next sweep")
                }
            }
        }

        {
            let mut zones = self.zones.lock();
            for (id, entry) in zones.iter_mut() {
                if sighted.contains(id) || entry.status == ZoneStatus::Stale {
                    continue;
                }
                if now.saturating_duration_since(entry.last_seen) > self.staleness_threshold {
                    entry.status = ZoneStatus::Stale;
                    report.went_stale.push(id.clone());
                    events.push(ZoneEvent::Offline(id.clone()));
                }
            }
        }

        self.notify(events);
        report
    }

    fn notify(&self, events: Vec<ZoneEvent>) {
        if events.is_empty() {
            return;
        }

        let mut observer = self.observer.lock();
        for event in events {
            match &event {
                ZoneEvent::Offline(id) => tracing::warn!(zone = %id, "zone went offline"),
                ZoneEvent::Online(id) => tracing::info!(zone = %id, "zone back online"),
            }

            let delivered = observer.as_ref().map(|tx| tx.send(event).is_ok());
            if delivered == Some(false) {
                *observer = None;
            }
        }
    }

    /// Point-in-time copy of every player, stale ones included
    pub fn zones(&self) -> Vec<Arc<ZonePlayer>> {
        self.zones
            .lock()
            .values()
            .map(|entry| entry.player.clone())
            .collect()
    }

    pub fn get(&self, zone_id: &str) -> Option<Arc<ZonePlayer>> {
        self.zones
            .lock()
            .get(zone_id)
            .map(|entry| entry.player.clone())
    }

    pub fn status(&self, zone_id: &str) -> Option<ZoneStatus> {
        self.zones.lock().get(zone_id).map(|entry| entry.status)
    }

    pub fn last_seen(&self, zone_id: &str) -> Option<Instant> {
        self.zones.lock().get(zone_id).map(|entry| entry.last_seen)
    }

    pub fn len(&self) -> usize {
        self.zones.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.lock().is_empty()
    }
}
