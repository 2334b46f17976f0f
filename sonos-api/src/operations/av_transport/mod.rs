//! AVTransport service operations
//!
//! Transport control (play, pause, stop, skip) and the transport state and
//! position queries a refresh relies on.

mod get_position_info;
mod get_transport_info;
mod next;
mod pause;
mod play;
mod previous;
mod stop;

pub use get_position_info::{GetPositionInfoOperation, GetPositionInfoResponse};
pub use get_transport_info::{GetTransportInfoOperation, GetTransportInfoResponse, TransportState};
pub use next::NextOperation;
pub use pause::PauseOperation;
pub use play::{PlayOperation, PlayRequest};
pub use previous::PreviousOperation;
pub use stop::StopOperation;

use super::DEFAULT_INSTANCE_ID;

/// Request carrying only the transport instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceRequest {
    pub instance_id: u32,
}

impl Default for InstanceRequest {
    fn default() -> Self {
        Self {
            instance_id: DEFAULT_INSTANCE_ID,
        }
    }
}

fn instance_payload(request: &InstanceRequest) -> String {
    format!("<InstanceID>{}</InstanceID>", request.instance_id)
}
