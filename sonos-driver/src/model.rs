//! Normalized media player state, as published to the device model

use std::collections::BTreeMap;

/// Playback state of a media player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlState {
    Playing,
    Paused,
    Stopped,
    Idle,
}

impl ControlState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlState::Playing => "playing",
            ControlState::Paused => "paused",
            ControlState::Stopped => "stopped",
            ControlState::Idle => "idle",
        }
    }
}

impl std::fmt::Display for ControlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Volume and mute. Either half may be absent in a command; refreshes always
/// carry both.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VolumeState {
    /// Level in `[0, 1]`
    pub level: Option<f64>,
    pub muted: Option<bool>,
}

impl VolumeState {
    pub fn new(level: Option<f64>, muted: Option<bool>) -> Self {
        Self { level, muted }
    }
}

/// The track a zone is playing, rebuilt on every refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MusicTrack {
    /// Track URI
    pub id: String,
    pub title: Option<String>,
    pub album: Option<String>,
    pub artists: Vec<String>,
    pub duration_ms: Option<u64>,
}

/// What was last published on the media channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaState {
    /// `None` means nothing is loaded
    pub track: Option<MusicTrack>,
    pub position_ms: Option<u64>,
}

/// Identity the driver announces and exports on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverInfo {
    pub id: String,
    pub name: String,
    pub version: String,
}

impl DriverInfo {
    pub fn sonos() -> Self {
        Self {
            id: "com.ninjablocks.sonos".to_string(),
            name: "driver-sonos".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A channel a media player device exposes on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// Transport control, reporting the listed states
    Control(Vec<ControlState>),
    /// Volume level, optionally with mute
    Volume { mute: bool },
    /// Current track
    Media,
}

/// A media player device as announced on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncedDevice {
    pub natural_id: String,
    pub natural_id_type: String,
    pub name: String,
    pub signatures: BTreeMap<String, String>,
    pub channels: Vec<Channel>,
}

impl AnnouncedDevice {
    /// Announcement for the zone `zone_id` named `name`
    pub fn zone_player(zone_id: &str, name: &str) -> Self {
        let signatures = [
            ("ninja:manufacturer", "Sonos"),
            ("ninja:productName", "Sonos Player"),
            ("ninja:productType", "MediaPlayer"),
            ("ninja:thingType", "mediaplayer"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        Self {
            natural_id: zone_id.to_string(),
            natural_id_type: "sonos".to_string(),
            name: name.to_string(),
            signatures,
            channels: vec![
                Channel::Control(vec![
                    ControlState::Playing,
                    ControlState::Paused,
                    ControlState::Stopped,
                    ControlState::Idle,
                ]),
                Channel::Volume { mute: true },
                Channel::Media,
            ],
        }
    }
}
