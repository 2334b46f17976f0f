//! RenderingControl service operations
//!
//! Volume and mute on a zone player's output channel.

mod get_mute;
mod get_volume;
mod set_mute;
mod set_volume;

pub use get_mute::{GetMuteOperation, GetMuteRequest, GetMuteResponse};
pub use get_volume::{GetVolumeOperation, GetVolumeRequest, GetVolumeResponse};
pub use set_mute::{SetMuteOperation, SetMuteRequest};
pub use set_volume::{SetVolumeOperation, SetVolumeRequest};

/// The channel every zone player supports
pub const MASTER_CHANNEL: &str = "Master";

fn channel_payload(instance_id: u32, channel: &str) -> String {
    format!("<InstanceID>{instance_id}</InstanceID><Channel>{channel}</Channel>")
}
