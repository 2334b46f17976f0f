//! Zone player adapter
//!
//! Binds one zone to the connection of its first member and to the
//! device-model handle announced for it. Commands are forwarded to the
//! device and echoed to the device model; [`ZonePlayer::refresh_state`]
//! re-reads everything and republishes it.

use std::sync::Arc;

use parking_lot::Mutex;
use sonos_api::operations::av_transport::TransportState;
use sonos_api::operations::rendering_control::MASTER_CHANNEL;
use sonos_api::operations::DEFAULT_INSTANCE_ID;
use sonos_parser::DidlLite;

use crate::bus::{MediaPlayerCommands, MediaPlayerDevice};
use crate::connection::DeviceConnection;
use crate::duration::{self, NOT_IMPLEMENTED};
use crate::error::{DriverError, Result};
use crate::model::{ControlState, MediaState, MusicTrack, VolumeState};

const DEFAULT_SPEED: &str = "1";

/// Last state published for a zone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSnapshot {
    pub control: Option<ControlState>,
    pub volume: Option<VolumeState>,
    pub media: Option<MediaState>,
}

pub struct ZonePlayer {
    zone_id: String,
    name: String,
    connection: Arc<dyn DeviceConnection>,
    device: Arc<dyn MediaPlayerDevice>,
    max_volume: u16,
    snapshot: Mutex<PlayerSnapshot>,
}

impl std::fmt::Debug for ZonePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZonePlayer")
            .field("zone_id", &self.zone_id)
            .field("name", &self.name)
            .field("max_volume", &self.max_volume)
            .finish_non_exhaustive()
    }
}

impl ZonePlayer {
    pub fn new(
        zone_id: impl Into<String>,
        name: impl Into<String>,
        connection: Arc<dyn DeviceConnection>,
        device: Arc<dyn MediaPlayerDevice>,
        max_volume: u16,
    ) -> Self {
        Self {
            zone_id: zone_id.into(),
            name: name.into(),
            connection,
            device,
            max_volume: max_volume.max(1),
            snapshot: Mutex::new(PlayerSnapshot::default()),
        }
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// State as last published
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.lock().clone()
    }

    /// Start or pause playback and publish the resulting state.
    pub fn play_pause(&self, playing: bool) -> Result<()> {
        tracing::info!(zone = %self.zone_id, playing, "play/pause");

        if playing {
            self.connection.play(DEFAULT_INSTANCE_ID, DEFAULT_SPEED)?;
            self.publish_control(ControlState::Playing)
        } else {
            self.connection.pause(DEFAULT_INSTANCE_ID)?;
            self.publish_control(ControlState::Paused)
        }
    }

    pub fn stop(&self) -> Result<()> {
        tracing::info!(zone = %self.zone_id, "stop");

        self.connection.stop(DEFAULT_INSTANCE_ID)?;
        self.publish_control(ControlState::Stopped)
    }

    /// Skip backwards for a negative `delta`, forwards otherwise. Only one
    /// track is skipped whatever the magnitude.
    pub fn playlist_jump(&self, delta: i32) -> Result<()> {
        tracing::info!(zone = %self.zone_id, delta, "playlist jump");

        if delta < 0 {
            self.connection.previous(DEFAULT_INSTANCE_ID)?;
        } else {
            self.connection.next(DEFAULT_INSTANCE_ID)?;
        }
        Ok(())
    }

    /// Apply whichever halves of `volume` are present, then publish the
    /// applied state without reading it back. Levels outside `[0, 1]` are
    /// clamped before either happens.
    pub fn set_volume(&self, volume: VolumeState) -> Result<()> {
        tracing::info!(zone = %self.zone_id, level = ?volume.level, muted = ?volume.muted, "set volume");

        let volume = VolumeState::new(volume.level.map(clamp_level), volume.muted);
        if let Some(level) = volume.level {
            let native = native_volume(level, self.max_volume);
            self.connection
                .set_volume(DEFAULT_INSTANCE_ID, MASTER_CHANNEL, native)?;
        }

        if let Some(muted) = volume.muted {
            self.connection
                .set_mute(DEFAULT_INSTANCE_ID, MASTER_CHANNEL, muted)?;
        }

        self.publish_volume(volume)
    }

    /// Playing an arbitrary URL is not supported.
    pub fn play_url(&self, url: &str, queue: bool) -> Result<()> {
        tracing::debug!(zone = %self.zone_id, url, queue, "play_url requested");
        Err(DriverError::NotImplemented("play_url"))
    }

    /// Re-read track, volume, mute and transport state and publish them.
    ///
    /// Stops at the first failing step; whatever was published before it
    /// stays published.
    pub fn refresh_state(&self) -> Result<()> {
        tracing::debug!(zone = %self.zone_id, "refreshing state");

        self.refresh_media()?;

        let muted = self.connection.get_mute(DEFAULT_INSTANCE_ID, MASTER_CHANNEL)?;
        let native = self.connection.get_volume(DEFAULT_INSTANCE_ID, MASTER_CHANNEL)?;
        let level = normalized_volume(native, self.max_volume);
        tracing::debug!(zone = %self.zone_id, native, level, muted, "volume read");
        self.publish_volume(VolumeState::new(Some(level), Some(muted)))?;

        let transport = self.connection.get_transport_info(DEFAULT_INSTANCE_ID)?;
        match control_state_for(&transport.current_transport_state) {
            Some(state) => self.publish_control(state)?,
            None => tracing::debug!(
                zone = %self.zone_id,
                state = ?transport.current_transport_state,
                "transport state not published"
            ),
        }

        Ok(())
    }

    fn refresh_media(&self) -> Result<()> {
        let position = self.connection.get_position_info(DEFAULT_INSTANCE_ID)?;

        if position.track_metadata.is_empty() {
            tracing::debug!(zone = %self.zone_id, "no track loaded");
            return self.publish_media(None, None);
        }

        let duration_ms = optional_millis(&position.track_duration)?;
        let position_ms = optional_millis(&position.rel_time)?;

        let mut track = MusicTrack {
            id: position.track_uri,
            duration_ms,
            ..MusicTrack::default()
        };

        match decode_track_metadata(&position.track_metadata) {
            Ok(Some(details)) => {
                track.title = details.title;
                track.album = details.album;
                track.artists = details.artists;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(zone = %self.zone_id, error = %e, "ignoring undecodable track metadata")
            }
        }

        self.publish_media(Some(track), position_ms)
    }

    fn publish_control(&self, state: ControlState) -> Result<()> {
        self.device.update_control_state(state)?;
        self.snapshot.lock().control = Some(state);
        Ok(())
    }

    fn publish_volume(&self, volume: VolumeState) -> Result<()> {
        self.device.update_volume_state(&volume)?;
        self.snapshot.lock().volume = Some(volume);
        Ok(())
    }

    fn publish_media(&self, track: Option<MusicTrack>, position_ms: Option<u64>) -> Result<()> {
        self.device
            .update_music_media_state(track.as_ref(), position_ms)?;
        self.snapshot.lock().media = Some(MediaState { track, position_ms });
        Ok(())
    }
}

impl MediaPlayerCommands for ZonePlayer {
    fn apply_play_pause(&self, playing: bool) -> Result<()> {
        self.play_pause(playing)
    }

    fn apply_stop(&self) -> Result<()> {
        self.stop()
    }

    fn apply_playlist_jump(&self, delta: i32) -> Result<()> {
        self.playlist_jump(delta)
    }

    fn apply_volume(&self, volume: VolumeState) -> Result<()> {
        self.set_volume(volume)
    }

    fn apply_play_url(&self, url: &str, queue: bool) -> Result<()> {
        self.play_url(url, queue)
    }
}

/// Requested level forced into `[0, 1]`; NaN counts as silence
fn clamp_level(level: f64) -> f64 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

/// Device volume as a level in `[0, 1]`
pub fn normalized_volume(native: u16, max_volume: u16) -> f64 {
    if max_volume == 0 {
        return 0.0;
    }
    (f64::from(native) / f64::from(max_volume)).min(1.0)
}

/// Level in `[0, 1]` on the device's native scale. Out of range levels are
/// clamped.
pub fn native_volume(level: f64, max_volume: u16) -> u16 {
    (clamp_level(level) * f64::from(max_volume)).round() as u16
}

fn control_state_for(state: &TransportState) -> Option<ControlState> {
    match state {
        TransportState::Playing => Some(ControlState::Playing),
        TransportState::PausedPlayback => Some(ControlState::Paused),
        TransportState::Stopped => Some(ControlState::Stopped),
        TransportState::Transitioning | TransportState::Other(_) => None,
    }
}

/// Milliseconds for a reported time, `None` when the device cannot report it
fn optional_millis(text: &str) -> Result<Option<u64>> {
    if text.is_empty() || text == NOT_IMPLEMENTED {
        return Ok(None);
    }
    Ok(Some(duration::parse_millis(text)?))
}

struct TrackDetails {
    title: Option<String>,
    album: Option<String>,
    artists: Vec<String>,
}

/// Title, album and artist of the first DIDL-Lite item, if there is one
fn decode_track_metadata(xml: &str) -> Result<Option<TrackDetails>> {
    let didl = DidlLite::from_xml(xml)?;

    Ok(didl.first_item().map(|item| TrackDetails {
        title: item.title.clone(),
        album: item.album.clone(),
        artists: item.creator.iter().cloned().collect(),
    }))
}
