/// The UPnP services a zone player connection is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// AVTransport service - playback control (play, pause, stop, skip)
    AVTransport,

    /// RenderingControl service - volume and mute
    RenderingControl,

    /// ZoneGroupTopology service - zone membership and naming
    ZoneGroupTopology,

    /// ContentDirectory service - browsing the music library and queue
    ContentDirectory,
}

/// Contains the endpoint and service URI information for a UPnP service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// The HTTP control endpoint path, relative to the device base URL
    pub endpoint: &'static str,

    /// The UPnP service URI used in SOAP requests
    pub service_uri: &'static str,

    /// The HTTP endpoint path for event subscriptions
    pub event_endpoint: &'static str,
}

impl Service {
    /// Every service, in the order connections are opened
    pub const ALL: [Service; 4] = [
        Service::RenderingControl,
        Service::AVTransport,
        Service::ZoneGroupTopology,
        Service::ContentDirectory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Service::AVTransport => "AVTransport",
            Service::RenderingControl => "RenderingControl",
            Service::ZoneGroupTopology => "ZoneGroupTopology",
            Service::ContentDirectory => "ContentDirectory",
        }
    }

    /// Endpoint paths and service URI for this service
    pub fn info(&self) -> ServiceInfo {
        match self {
            Service::AVTransport => ServiceInfo {
                endpoint: "MediaRenderer/AVTransport/Control",
                service_uri: "urn:schemas-upnp-org:service:AVTransport:1",
                event_endpoint: "MediaRenderer/AVTransport/Event",
            },
            Service::RenderingControl => ServiceInfo {
                endpoint: "MediaRenderer/RenderingControl/Control",
                service_uri: "urn:schemas-upnp-org:service:RenderingControl:1",
                event_endpoint: "MediaRenderer/RenderingControl/Event",
            },
            Service::ZoneGroupTopology => ServiceInfo {
                endpoint: "ZoneGroupTopology/Control",
                service_uri: "urn:schemas-upnp-org:service:ZoneGroupTopology:1",
                event_endpoint: "ZoneGroupTopology/Event",
            },
            Service::ContentDirectory => ServiceInfo {
                endpoint: "MediaServer/ContentDirectory/Control",
                service_uri: "urn:schemas-upnp-org:service:ContentDirectory:1",
                event_endpoint: "MediaServer/ContentDirectory/Event",
            },
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
