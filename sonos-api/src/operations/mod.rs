//! UPnP actions used by the driver, grouped by service

pub mod av_transport;
pub mod rendering_control;
pub mod zone_group_topology;

/// Zone players expose a single AVTransport/RenderingControl instance
pub const DEFAULT_INSTANCE_ID: u32 = 0;
