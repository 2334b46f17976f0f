//! Seams to the application bus and the device model it hosts
//!
//! The driver announces itself and one media player per zone through a
//! [`DriverBus`], then pushes state through the returned
//! [`MediaPlayerDevice`] handles. Commands flow the other way: each device
//! model is bound to the zone's [`MediaPlayerCommands`] and hands incoming
//! [`PlayerCommand`]s to it.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{DriverError, Result};
use crate::model::{AnnouncedDevice, ControlState, DriverInfo, MusicTrack, VolumeState};

/// Handlers a media player exposes to the bus
pub trait MediaPlayerCommands: Send + Sync {
    /// `true` plays, `false` pauses
    fn apply_play_pause(&self, playing: bool) -> Result<()>;

    fn apply_stop(&self) -> Result<()>;

    /// Move through the queue; positive is forward
    fn apply_playlist_jump(&self, delta: i32) -> Result<()>;

    fn apply_volume(&self, volume: VolumeState) -> Result<()>;

    fn apply_play_url(&self, url: &str, queue: bool) -> Result<()>;
}

/// Command a bus client sends to one media player
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    PlayPause(bool),
    Stop,
    PlaylistJump(i32),
    SetVolume(VolumeState),
    PlayUrl { url: String, queue: bool },
}

impl PlayerCommand {
    pub fn apply_to(&self, commands: &dyn MediaPlayerCommands) -> Result<()> {
        match self {
            PlayerCommand::PlayPause(playing) => commands.apply_play_pause(*playing),
            PlayerCommand::Stop => commands.apply_stop(),
            PlayerCommand::PlaylistJump(delta) => commands.apply_playlist_jump(*delta),
            PlayerCommand::SetVolume(volume) => commands.apply_volume(*volume),
            PlayerCommand::PlayUrl { url, queue } => commands.apply_play_url(url, *queue),
        }
    }
}

/// Console form: `play`, `pause`, `stop`, `next`, `previous`, `jump <n>`,
/// `volume <0..1>`, `mute`, `unmute`, `url <uri>` or `queue <uri>`.
impl FromStr for PlayerCommand {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self> {
        let mut words = s.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let argument = words.next();
        let invalid = || DriverError::Bus(format!("unrecognised command: {}", s.trim()));

        let command = match (verb, argument) {
            ("play", None) => PlayerCommand::PlayPause(true),
            ("pause", None) => PlayerCommand::PlayPause(false),
            ("stop", None) => PlayerCommand::Stop,
            ("next", None) => PlayerCommand::PlaylistJump(1),
            ("previous" | "prev", None) => PlayerCommand::PlaylistJump(-1),
            ("jump", Some(delta)) => PlayerCommand::PlaylistJump(delta.parse().map_err(|_| invalid())?),
            ("volume", Some(level)) => {
                let level: f64 = level.parse().map_err(|_| invalid())?;
                PlayerCommand::SetVolume(VolumeState::new(Some(level), None))
            }
            ("mute", None) => PlayerCommand::SetVolume(VolumeState::new(None, Some(true))),
            ("unmute", None) => PlayerCommand::SetVolume(VolumeState::new(None, Some(false))),
            ("url", Some(url)) => PlayerCommand::PlayUrl {
                url: url.to_string(),
                queue: false,
            },
            ("queue", Some(url)) => PlayerCommand::PlayUrl {
                url: url.to_string(),
                queue: true,
            },
            _ => return Err(invalid()),
        };

        if words.next().is_some() {
            return Err(invalid());
        }
        Ok(command)
    }
}

/// The command handlers a device model was bound to.
///
/// Held weakly: the registry owns the zone player, so a player dropped from
/// the registry stops receiving commands.
#[derive(Default)]
pub struct CommandBinding {
    commands: Mutex<Option<Weak<dyn MediaPlayerCommands>>>,
}

impl CommandBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, commands: Weak<dyn MediaPlayerCommands>) {
        *self.commands.lock() = Some(commands);
    }

    pub fn dispatch(&self, command: &PlayerCommand) -> Result<()> {
        let commands = self
            .commands
            .lock()
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or_else(|| DriverError::Bus("no zone player bound to this device".to_string()))?;
        command.apply_to(commands.as_ref())
    }
}

/// Device-model object that receives normalized state for one zone
pub trait MediaPlayerDevice: Send + Sync {
    fn update_control_state(&self, state: ControlState) -> Result<()>;

    fn update_volume_state(&self, state: &VolumeState) -> Result<()>;

    /// `None` track means nothing is loaded
    fn update_music_media_state(&self, track: Option<&MusicTrack>, position_ms: Option<u64>) -> Result<()>;

    /// Route the bus's commands for this device to `commands`
    fn bind_commands(&self, commands: Weak<dyn MediaPlayerCommands>);
}

/// Bus session the driver is exported on
pub trait DriverBus: Send + Sync {
    fn announce_driver(&self, info: &DriverInfo) -> Result<()>;

    fn export_driver(&self, info: &DriverInfo) -> Result<()>;

    /// Register a media player and return the handle its state is published through
    fn announce_device(&self, device: AnnouncedDevice) -> Result<Arc<dyn MediaPlayerDevice>>;
}

/// Bus that writes every announcement and update to the log and accepts
/// commands through [`LoggingBus::dispatch`]
#[derive(Default)]
pub struct LoggingBus {
    players: Mutex<BTreeMap<String, Arc<LoggedPlayer>>>,
}

impl LoggingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zones announced so far
    pub fn zone_ids(&self) -> Vec<String> {
        self.players.lock().keys().cloned().collect()
    }

    /// Deliver `command` to the player announced as `zone_id`
    pub fn dispatch(&self, zone_id: &str, command: &PlayerCommand) -> Result<()> {
        let player = self
            .players
            .lock()
            .get(zone_id)
            .cloned()
            .ok_or_else(|| DriverError::Bus(format!("no media player announced as {zone_id}")))?;

        tracing::debug!(zone = %zone_id, ?command, "dispatching command");
        player.commands.dispatch(command)
    }
}

impl DriverBus for LoggingBus {
    fn announce_driver(&self, info: &DriverInfo) -> Result<()> {
        tracing::info!(id = %info.id, name = %info.name, version = %info.version, "driver announced");
        Ok(())
    }

    fn export_driver(&self, info: &DriverInfo) -> Result<()> {
        tracing::debug!(id = %info.id, "driver exported");
        Ok(())
    }

    fn announce_device(&self, device: AnnouncedDevice) -> Result<Arc<dyn MediaPlayerDevice>> {
        tracing::info!(id = %device.natural_id, name = %device.name, "media player announced");
        let player = Arc::new(LoggedPlayer {
            name: device.name,
            commands: CommandBinding::new(),
        });
        self.players.lock().insert(device.natural_id, player.clone());
        Ok(player)
    }
}

struct LoggedPlayer {
    name: String,
    commands: CommandBinding,
}

impl MediaPlayerDevice for LoggedPlayer {
    fn update_control_state(&self, state: ControlState) -> Result<()> {
        tracing::info!(zone = %self.name, %state, "control state");
        Ok(())
    }

    fn update_volume_state(&self, state: &VolumeState) -> Result<()> {
        tracing::info!(zone = %self.name, level = ?state.level, muted = ?state.muted, "volume state");
        Ok(())
    }

    fn update_music_media_state(&self, track: Option<&MusicTrack>, position_ms: Option<u64>) -> Result<()> {
        match track {
            Some(track) => tracing::info!(
                zone = %self.name,
                uri = %track.id,
                title = ?track.title,
                artists = ?track.artists,
                duration_ms = ?track.duration_ms,
                position_ms = ?position_ms,
                "media state"
            ),
            None => tracing::info!(zone = %self.name, "no media"),
        }
        Ok(())
    }

    fn bind_commands(&self, commands: Weak<dyn MediaPlayerCommands>) {
        self.commands.bind(commands);
    }
}
